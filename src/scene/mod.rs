pub mod agent_scene;
pub mod manager;
pub mod traits;
pub mod war_scene;

pub use agent_scene::AgentScene;
pub use manager::{SceneManager, SimulationMode};
pub use traits::{Scene, SceneStats};
pub use war_scene::WarScene;
