fn main() {
    // Rebuild when the embedded compute kernels change
    println!("cargo:rerun-if-changed=shaders/game_of_war.wgsl");
    println!("cargo:rerun-if-changed=shaders/agents.wgsl");
    println!("cargo:rerun-if-changed=shaders/blit.wgsl");
    // Embedded default configuration
    println!("cargo:rerun-if-changed=config.ron");
}
