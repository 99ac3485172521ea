//! Host compilation and dynamic loading.
//!
//! Compiles C source with the configured compiler (`-shared -fPIC -O3`,
//! optionally `-fopenmp`) and loads the resulting shared library. Functions
//! are resolved through the `<name>_entry(void**)` thunk the host generator
//! emits for every kernel.

use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use frx_dtype::NativeType;
use snafu::{ResultExt, ensure};

use crate::config::HostConfig;
use crate::error::{
    ArgumentMismatchSnafu, CompilationSnafu, IoSnafu, LibraryLoadSnafu, Result, SymbolNotFoundSnafu,
};
use crate::marshal::NativeArg;

type EntryFn = unsafe extern "C" fn(*const *mut c_void);

/// A compiled shared library.
pub struct SourceModule {
    lib: libloading::Library,
    path: PathBuf,
    /// Keep the temp directory alive so the .so isn't deleted.
    _tmp_dir: tempfile::TempDir,
}

impl std::fmt::Debug for SourceModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceModule").field("path", &self.path).finish()
    }
}

impl SourceModule {
    /// Compile `src` and load the shared library.
    pub fn compile(src: &str, config: &HostConfig) -> Result<Self> {
        let tmp_dir =
            tempfile::Builder::new().prefix("frx-").tempdir().context(IoSnafu { what: "creating build directory" })?;

        let src_path = tmp_dir.path().join("module.c");
        let so_path = tmp_dir.path().join("module.so");
        std::fs::write(&src_path, src).context(IoSnafu { what: "writing source file" })?;

        let mut cmd = std::process::Command::new(&config.cc);
        cmd.args(["-shared", "-fPIC", "-O3"]);
        if config.openmp {
            cmd.arg("-fopenmp");
        }
        cmd.args(&config.cflags).arg("-o").arg(&so_path).arg(&src_path).arg("-lm");

        let output = cmd
            .output()
            .map_err(|e| CompilationSnafu { reason: format!("failed to run {}: {e}", config.cc) }.build())?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return CompilationSnafu { reason: format!("{} failed:\n{stderr}\nSource:\n{src}", config.cc) }.fail();
        }

        // SAFETY: the library was just built from generated source; its
        // initialisers are the C runtime's own.
        let lib = unsafe { libloading::Library::new(&so_path) }
            .context(LibraryLoadSnafu { path: so_path.display().to_string() })?;

        tracing::debug!(
            path = %so_path.display(),
            cc = %config.cc,
            openmp = config.openmp,
            "host module compiled and loaded"
        );

        Ok(Self { lib, path: so_path, _tmp_dir: tmp_dir })
    }

    /// Path of the shared library.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve kernel `name` with the given native argument types.
    pub fn function(self: &Arc<Self>, name: &str, argtypes: &[NativeType]) -> Result<HostFunction> {
        let symbol = format!("{name}_entry");
        // SAFETY: the host generator emits every entry thunk with this signature.
        let entry = unsafe {
            let sym: libloading::Symbol<EntryFn> =
                self.lib.get(symbol.as_bytes()).context(SymbolNotFoundSnafu { name: symbol.clone() })?;
            *sym
        };

        Ok(HostFunction { name: name.to_string(), argtypes: argtypes.to_vec(), entry, _module: Arc::clone(self) })
    }
}

/// A host kernel resolved from a [`SourceModule`].
///
/// Calls run synchronously on the calling thread.
pub struct HostFunction {
    name: String,
    argtypes: Vec<NativeType>,
    entry: EntryFn,
    _module: Arc<SourceModule>,
}

impl std::fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostFunction").field("name", &self.name).field("argtypes", &self.argtypes).finish()
    }
}

impl HostFunction {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn argtypes(&self) -> &[NativeType] {
        &self.argtypes
    }

    /// Invoke the kernel.
    ///
    /// The argument sequence is checked against the declared types. Address
    /// arguments are dereferenced by the kernel, so they must point to live
    /// host allocations of sufficient size; operand descriptors guarantee this.
    pub fn call(&self, args: &[NativeArg]) -> Result<()> {
        ensure!(
            args.len() == self.argtypes.len() && args.iter().zip(&self.argtypes).all(|(a, t)| a.native_type() == *t),
            ArgumentMismatchSnafu {
                reason: format!(
                    "{} expects {:?}, got {:?}",
                    self.name,
                    self.argtypes,
                    args.iter().map(NativeArg::native_type).collect::<Vec<_>>()
                )
            }
        );

        let mut slots: Vec<*mut c_void> = args.iter().map(NativeArg::as_void_ptr).collect();
        tracing::trace!(kernel.name = %self.name, kernel.num_args = slots.len(), "executing host kernel");

        // SAFETY: each slot points at a value of the type the thunk reads, and
        // `args` outlives the call.
        unsafe { (self.entry)(slots.as_mut_ptr()) };
        Ok(())
    }
}
