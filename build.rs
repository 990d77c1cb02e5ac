/// dllguard build script.
///
/// Hardens how the binary's own load-time imports are resolved.  Runtime
/// loads go through `search_order`; this covers the DLLs the loader maps
/// before `main` runs.
fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Non-Windows hosts still build the library (every platform call reports
    // `Unsupported`), so there is nothing to link here.
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os != "windows" {
        return;
    }

    // /DEPENDENTLOADFLAG is an MSVC linker option; the GNU toolchain has no
    // equivalent.
    let target_env = std::env::var("CARGO_CFG_TARGET_ENV").unwrap_or_default();
    if target_env != "msvc" {
        return;
    }

    // 0x800 = LOAD_LIBRARY_SEARCH_SYSTEM32.  Applies to static imports of the
    // binary only, so the integration tests keep the default search order.
    // https://learn.microsoft.com/en-us/cpp/build/reference/dependentloadflag
    println!("cargo:rustc-link-arg-bins=/DEPENDENTLOADFLAG:0x800");
}
