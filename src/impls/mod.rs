#[cfg(feature = "dummy")]
pub mod dummy;
#[cfg(feature = "dummy")]
pub use dummy::Dummy;

#[cfg(feature = "libbladerf")]
pub mod libbladerf;
#[cfg(feature = "libbladerf")]
pub use libbladerf::LibBladeRf;
