//! Byte-stride accounting for GPU structured records.
//!
//! Kernel-side arrays are declared with tightly packed fields; the host
//! stride is the plain sum of field widths with no implicit padding. A
//! mismatch between the declared shape and the actual `#[repr(C)]` layout
//! corrupts the buffer silently on the GPU, so every driver runs [`check`]
//! for the records it uploads before allocating anything.

use bytemuck::Pod;

use super::DriverError;

/// A fixed-width field of a structured GPU record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Uint,
    Int,
    Float,
    /// RGBA color: four packed f32 components.
    Color,
}

impl Field {
    pub const fn width(self) -> u32 {
        match self {
            Field::Uint | Field::Int | Field::Float => 4,
            Field::Color => 16,
        }
    }
}

/// Total byte stride of a record shape: the sum of its field widths.
pub const fn stride(fields: &[Field]) -> u32 {
    let mut total = 0;
    let mut i = 0;
    while i < fields.len() {
        total += fields[i].width();
        i += 1;
    }
    total
}

/// A CPU record mirroring one element of a GPU structured buffer.
pub trait GpuRecord: Pod {
    const NAME: &'static str;
    const SHAPE: &'static [Field];

    fn stride() -> u32 {
        stride(Self::SHAPE)
    }
}

/// Verify the declared shape against the actual `#[repr(C)]` layout.
pub fn check<T: GpuRecord>() -> Result<(), DriverError> {
    let declared = T::stride();
    let actual = std::mem::size_of::<T>() as u32;
    if declared != actual {
        return Err(DriverError::Layout {
            record: T::NAME,
            declared,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_widths() {
        assert_eq!(Field::Uint.width(), 4);
        assert_eq!(Field::Int.width(), 4);
        assert_eq!(Field::Float.width(), 4);
        assert_eq!(Field::Color.width(), 16);
    }

    #[test]
    fn test_stride_is_sum_of_field_widths() {
        assert_eq!(stride(&[]), 0);
        assert_eq!(stride(&[Field::Uint, Field::Uint, Field::Uint, Field::Uint]), 16);
        assert_eq!(stride(&[Field::Color, Field::Color, Field::Color]), 48);
        assert_eq!(stride(&[Field::Float, Field::Color]), 20);
        assert_eq!(
            stride(&[Field::Float, Field::Float, Field::Float, Field::Int]),
            16
        );
    }
}
