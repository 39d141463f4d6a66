//! Common utils for integration tests
//!
//! Each test gets a scratch directory with a source tree built
//! programmatically, plus a stub engine script standing in for the external
//! compiler.

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use transpile::{transpile, Config, Verbosity};

/// Stub engine: echoes the source back with a ` | compiled` marker, and a
/// sourcemap when the options ask for one.
#[allow(dead_code)]
pub const ENGINE_SH: &str = r#"#!/bin/sh
opts=""
file=""
while [ $# -gt 0 ]; do
    case "$1" in
        --options) opts="$2"; shift 2 ;;
        *) file="$1"; shift ;;
    esac
done
if [ -n "$file" ]; then
    src=$(cat "$file")
else
    src=$(cat)
fi
case "$opts" in
    *'"source_maps":true'*) printf '{"code":"%s | compiled","map":"{}"}' "$src" ;;
    *) printf '{"code":"%s | compiled"}' "$src" ;;
esac
"#;

/// Stub engine that always fails.
#[allow(dead_code)]
pub const FAILING_ENGINE_SH: &str = "#!/bin/sh\necho boom >&2\nexit 3\n";

/// Stub engine that floods stderr with diagnostics (well past a pipe
/// buffer) before reading any of its stdin.
#[allow(dead_code)]
pub const CHATTY_ENGINE_SH: &str = r#"#!/bin/sh
while [ $# -gt 0 ]; do
    case "$1" in
        --options) shift 2 ;;
        *) shift ;;
    esac
done
i=0
while [ $i -lt 2000 ]; do
    echo "engine diagnostic line with enough padding to fill the pipe" >&2
    i=$((i+1))
done
src=$(cat)
printf '{"code":"%s | compiled"}' "$src"
"#;

pub struct ItEnv {
    config: Config,
    test_description: String,
    dir: TempDir,
}

impl ItEnv {
    pub fn new(test_description: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();

        let mut config = Config::default();
        config.verbosity = Verbosity::Quiet;
        config.base_dir = dir.path().to_path_buf();
        config.out_dir = dir.path().join("dist");
        config.num_threads = 2;

        Self {
            config,
            test_description: test_description.to_string(),
            dir,
        }
    }

    #[inline]
    pub fn execute<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Self),
    {
        f(self)
    }

    #[inline]
    pub fn cfg(&mut self) -> &mut Config {
        &mut self.config
    }

    #[inline]
    pub fn run(&self) -> Result<(), ()> {
        transpile(self.config.clone())
    }

    #[inline]
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn set_file(&self, file_name: &str, contents: &str) {
        let path = self.path(file_name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
    }

    /// Install a stub engine script and point the config at it.
    #[cfg(unix)]
    pub fn set_engine(&mut self, script: &str) {
        use std::os::unix::fs::PermissionsExt;
        let path = self.path("engine.sh");
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        self.config.engine_cmd = path.display().to_string();
    }

    /// Poll until the file holds the expected contents, for runs that keep
    /// going in the background (watch mode).
    #[allow(dead_code)]
    pub fn wait_file_eq(&self, file_name: &str, expected: &str) {
        use std::time::{Duration, Instant};
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let path = self.path(file_name);
            if let Ok(actual) = fs::read_to_string(&path) {
                if actual == expected {
                    return;
                }
            }
            assert!(
                Instant::now() < deadline,
                "file `{}` did not reach the expected contents in test `{}` ({})",
                file_name,
                self.test_description,
                self.dir.path().display()
            );
            std::thread::sleep(Duration::from_millis(50));
        }
    }

    pub fn assert_file_eq(&self, file_name: &str, expected: &str) {
        let path = self.path(file_name);
        assert!(
            path.exists(),
            "expected output file `{}` does not exist in test `{}` ({})",
            file_name,
            self.test_description,
            self.dir.path().display()
        );
        let actual = fs::read_to_string(&path).unwrap();
        assert_eq!(
            actual, expected,
            "file comparison failed in test `{}` ({})",
            self.test_description,
            self.dir.path().display()
        );
    }

    #[inline]
    pub fn assert_path_exists(&self, path_name: &str, exists: bool) {
        assert_eq!(
            exists,
            self.path(path_name).exists(),
            "file existence test failed in test `{}` ({})",
            self.test_description,
            self.dir.path().display()
        );
    }
}

macro_rules! testit {
    ($test_name:ident, $fnonce:expr) => {
        #[test]
        #[allow(non_snake_case)]
        fn $test_name() {
            let mut env = ItEnv::new(stringify!($test_name));
            env.execute($fnonce);
        }
    };
}

pub(crate) use testit;
