//! GCC/Clang descriptor.

use crate::core::action::Action;

use super::{ActionTemplate, ArtifactConventions, DependencyMode, ToolchainDescriptor};

/// Registered name of the GCC-style backend.
pub const GCC_LIKE: &str = "gcc-like";

/// Flags that make the compiler write a Makefile fragment to `${depfile}`.
const DEPFILE_FLAGS: [&str; 3] = ["-MD", "-MF", "${depfile}"];

fn compile(driver: &str, flags_var: &str) -> ActionTemplate {
    let mut flags = vec![flags_var.to_string()];
    flags.extend(DEPFILE_FLAGS.iter().map(|f| f.to_string()));
    flags.extend(["-c", "${in}", "-o", "${out}"].map(String::from));
    ActionTemplate::new(driver, flags).deps(DependencyMode::GccDepfile)
}

fn link(driver: &str) -> ActionTemplate {
    ActionTemplate::new(driver, ["${ldflags}", "-o", "${out}", "${in}", "${libs}"])
}

/// GCC/Clang toolchain (Unix-like systems).
///
/// Objects and executables both use `-o <out>`; static libraries are
/// created with `ar`.
pub fn gcc_like() -> ToolchainDescriptor {
    ToolchainDescriptor::new(
        GCC_LIKE,
        ArtifactConventions {
            object_extension: "o",
            static_lib_prefix: "lib",
            static_lib_extension: "a",
            exe_extension: "",
        },
    )
    .default_var("cc", "gcc")
    .default_var("cxx", "g++")
    .default_var("ar", "ar")
    .default_var("arflags", "rcs")
    .template(Action::CompileC, compile("${cc}", "${cflags}"))
    .template(Action::CompileCxx, compile("${cxx}", "${cxxflags}"))
    .template(Action::Assemble, compile("${cc}", "${asflags}"))
    .template(
        Action::Preprocess,
        ActionTemplate::new("${cc}", ["${cppflags}", "-E", "${in}", "-o", "${out}"]),
    )
    .template(Action::LinkExe, link("${cc}"))
    .template(Action::LinkCxxExe, link("${cxx}"))
    .template(
        Action::Archive,
        ActionTemplate::new("${ar}", ["${arflags}", "${out}", "${in}"]),
    )
}

/// Infer the C++ compiler from a C compiler command.
///
/// Handles common patterns:
/// - gcc, x86_64-linux-gnu-gcc -> g++, x86_64-linux-gnu-g++
/// - clang -> clang++
/// - cc, /usr/bin/cc -> c++, /usr/bin/c++
pub fn infer_cxx(cc: &str) -> String {
    if let Some(prefix) = cc.strip_suffix("gcc") {
        return format!("{}g++", prefix);
    }

    if cc.ends_with("clang") {
        return format!("{}++", cc);
    }

    // Only a complete "cc" basename, not "mycc"
    let is_standalone_cc = cc == "cc"
        || cc.ends_with("/cc")
        || cc.ends_with("\\cc")
        || cc.ends_with("-cc");

    if let Some(prefix) = cc.strip_suffix("cc").filter(|_| is_standalone_cc) {
        return format!("{}c++", prefix);
    }

    format!("{}++", cc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gcc_descriptor_is_complete() {
        assert!(gcc_like().missing_actions().is_empty());
    }

    #[test]
    fn test_gcc_compile_tracks_depfile() {
        let desc = gcc_like();
        let template = desc.get(Action::CompileC).unwrap();
        assert_eq!(template.executable, "${cc}");
        assert_eq!(template.dependency_mode, DependencyMode::GccDepfile);
        assert!(template.flags.windows(2).any(|w| w == ["-MF", "${depfile}"]));

        let template = desc.get(Action::Preprocess).unwrap();
        assert_eq!(template.dependency_mode, DependencyMode::None);
    }

    #[test]
    fn test_gcc_archive_uses_ar() {
        let desc = gcc_like();
        let template = desc.get(Action::Archive).unwrap();
        assert_eq!(template.executable, "${ar}");
        assert_eq!(desc.defaults().get("arflags"), Some("rcs"));
    }

    #[test]
    fn test_infer_cxx() {
        assert_eq!(infer_cxx("gcc"), "g++");
        assert_eq!(infer_cxx("x86_64-linux-gnu-gcc"), "x86_64-linux-gnu-g++");
        assert_eq!(infer_cxx("clang"), "clang++");
        assert_eq!(infer_cxx("/usr/bin/cc"), "/usr/bin/c++");
        assert_eq!(infer_cxx("cc"), "c++");
        assert_eq!(infer_cxx("tcc"), "tcc++");
    }
}
