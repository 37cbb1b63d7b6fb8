//! MSVC descriptor.

use crate::core::action::Action;

use super::{ActionTemplate, ArtifactConventions, DependencyMode, ToolchainDescriptor};

/// Registered name of the MSVC-style backend.
pub const MSVC_LIKE: &str = "msvc-like";

/// Prefix `cl -showIncludes` puts in front of every included header.
///
/// Localized compilers print a translated prefix; override the
/// `msvc_deps_prefix` variable for those.
pub const MSVC_DEPS_PREFIX: &str = "Note: including file:";

fn link() -> ActionTemplate {
    ActionTemplate::new(
        "${link}",
        ["-nologo", "${ldflags}", "-out:${out}", "${in}", "${libs}"],
    )
}

/// MSVC toolchain (Windows).
///
/// `cl` compiles both C and C++ (`-TP` forces C++), `link` links and `lib`
/// archives. Output paths are attached to their flag (`-Fo<out>`,
/// `-out:<out>`).
pub fn msvc_like() -> ToolchainDescriptor {
    ToolchainDescriptor::new(
        MSVC_LIKE,
        ArtifactConventions {
            object_extension: "obj",
            static_lib_prefix: "",
            static_lib_extension: "lib",
            exe_extension: "exe",
        },
    )
    .default_var("cl", "cl")
    .default_var("link", "link")
    .default_var("lib", "lib")
    .default_var("ml", "ml64")
    .default_var("cxxflags", "-EHsc")
    .default_var("msvc_deps_prefix", MSVC_DEPS_PREFIX)
    .template(
        Action::CompileC,
        ActionTemplate::new(
            "${cl}",
            ["-nologo", "-showIncludes", "${cflags}", "-c", "${in}", "-Fo${out}"],
        )
        .deps(DependencyMode::MsvcStdoutScan),
    )
    .template(
        Action::CompileCxx,
        ActionTemplate::new(
            "${cl}",
            [
                "-nologo",
                "-showIncludes",
                "-TP",
                "${cxxflags}",
                "-c",
                "${in}",
                "-Fo${out}",
            ],
        )
        .deps(DependencyMode::MsvcStdoutScan),
    )
    .template(
        Action::Assemble,
        ActionTemplate::new("${ml}", ["-nologo", "${asflags}", "-c", "-Fo${out}", "${in}"]),
    )
    .template(
        Action::Preprocess,
        ActionTemplate::new("${cl}", ["-nologo", "${cppflags}", "-P", "-Fi${out}", "${in}"]),
    )
    .template(Action::LinkExe, link())
    .template(Action::LinkCxxExe, link())
    .template(
        Action::Archive,
        ActionTemplate::new("${lib}", ["-nologo", "${arflags}", "-out:${out}", "${in}"]),
    )
}
