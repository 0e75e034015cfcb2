use crate::error::Result;

/// Reports the kernel's ASLR slide for the current boot.
///
/// Called on every cache load and save and on vtab resolution, so
/// implementations should be cheap to call repeatedly.
pub trait SlideSource {
    fn kernel_slide(&self) -> Result<u64>;
}

impl<T: SlideSource + ?Sized> SlideSource for Box<T> {
    fn kernel_slide(&self) -> Result<u64> {
        (**self).kernel_slide()
    }
}

impl<T: SlideSource + ?Sized> SlideSource for &T {
    fn kernel_slide(&self) -> Result<u64> {
        (**self).kernel_slide()
    }
}

/// A slide determined up front
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedSlide(pub u64);

impl SlideSource for FixedSlide {
    fn kernel_slide(&self) -> Result<u64> {
        Ok(self.0)
    }
}
