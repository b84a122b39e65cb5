fn main() {
    #[cfg(feature = "libbladerf")]
    {
        println!("cargo:rustc-link-lib=bladeRF");
    }
}
