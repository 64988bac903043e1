use std::{
    env,
    path::{Path, PathBuf},
};

use crate::error::{PathError, PathResult};

/// Separator used by search-path environment variables such as `KEEL_DEPOT_PATH`.
pub const SEARCH_PATH_SEPARATOR: char = ':';

pub trait PathResolver {
    /// Resolves a path string that may contain environment variables
    ///
    /// This method expands environment variables in the format `$VAR` or `${VAR}`, resolves tilde
    /// (`~`) to the user's home directory when it appears at the start of the path, and converts
    /// relative paths to absolute paths based on the current working directory.
    ///
    /// # Errors
    ///
    /// * [`PathError::Empty`] if the path is empty
    /// * [`PathError::CurrentDir`] if the current directory cannot be determined
    /// * [`PathError::MissingEnvVar`] if the environment variables are undefined
    ///
    /// # Example
    ///
    /// ```
    /// use keel_utils::error::PathResult;
    /// use keel_utils::path::{PathResolver, SystemPathResolver};
    ///
    /// fn main() -> PathResult<()> {
    ///     let resolver = SystemPathResolver;
    ///     let resolved = resolver.resolve_path("$HOME/.keel")?;
    ///     println!("Resolved path is {:#?}", resolved);
    ///     Ok(())
    /// }
    /// ```
    fn resolve_path(&self, path: &str) -> PathResult<PathBuf>;

    /// Returns the user's home directory
    ///
    /// This method first checks the `HOME` environment variable. If not set, it falls back to
    /// `/home/$USER`, and to `/` when neither is available.
    fn home_dir(&self) -> PathBuf;

    /// Returns the user's config directory following XDG Base Directory Specification
    ///
    /// Checks `XDG_CONFIG_HOME`, defaulting to `$HOME/.config`.
    fn xdg_config_home(&self) -> PathBuf;

    /// Returns the user's data directory following XDG Base Directory Specification
    ///
    /// Checks `XDG_DATA_HOME`, defaulting to `$HOME/.local/share`.
    fn xdg_data_home(&self) -> PathBuf;
}

/// The default [`PathResolver`] implementation using environment variables and filesystem calls.
pub struct SystemPathResolver;

impl PathResolver for SystemPathResolver {
    fn resolve_path(&self, path: &str) -> PathResult<PathBuf> {
        let path = path.trim();

        if path.is_empty() {
            return Err(PathError::Empty);
        }

        let resolved = self.expand_variables(path)?;
        let path_buf = PathBuf::from(resolved);

        if path_buf.is_absolute() {
            Ok(path_buf)
        } else {
            env::current_dir()
                .map(|cwd| cwd.join(path_buf))
                .map_err(|err| PathError::CurrentDir { source: err })
        }
    }

    fn home_dir(&self) -> PathBuf {
        if let Ok(home) = env::var("HOME") {
            return PathBuf::from(home);
        }
        match env::var("USER") {
            Ok(user) if !user.is_empty() => PathBuf::from(format!("/home/{user}")),
            _ => PathBuf::from("/"),
        }
    }

    fn xdg_config_home(&self) -> PathBuf {
        env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| self.home_dir().join(".config"))
    }

    fn xdg_data_home(&self) -> PathBuf {
        env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| self.home_dir().join(".local/share"))
    }
}

impl SystemPathResolver {
    fn expand_variables(&self, path: &str) -> PathResult<String> {
        let mut result = String::with_capacity(path.len());
        let mut chars = path.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '$' => {
                    if chars.peek() == Some(&'{') {
                        chars.next();
                        let var_name = self.consume_until(&mut chars, '}')?;
                        self.expand_env_var(&var_name, &mut result, path)?;
                    } else {
                        let var_name = self.consume_var_name(&mut chars);
                        if var_name.is_empty() {
                            result.push('$');
                        } else {
                            self.expand_env_var(&var_name, &mut result, path)?;
                        }
                    }
                }
                '~' if result.is_empty() => result.push_str(&self.home_dir().to_string_lossy()),
                _ => result.push(c),
            }
        }

        Ok(result)
    }

    fn consume_until(
        &self,
        chars: &mut std::iter::Peekable<std::str::Chars>,
        delimiter: char,
    ) -> PathResult<String> {
        let mut var_name = String::new();

        for c in chars.by_ref() {
            if c == delimiter {
                return Ok(var_name);
            }
            var_name.push(c);
        }

        Err(PathError::UnclosedVariable {
            input: format!("${{{var_name}"),
        })
    }

    fn consume_var_name(&self, chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
        let mut var_name = String::new();

        while let Some(&c) = chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                var_name.push(c);
                chars.next();
            } else {
                break;
            }
        }

        var_name
    }

    fn expand_env_var(
        &self,
        var_name: &str,
        result: &mut String,
        original: &str,
    ) -> PathResult<()> {
        match var_name {
            "HOME" => result.push_str(&self.home_dir().to_string_lossy()),
            "XDG_CONFIG_HOME" => result.push_str(&self.xdg_config_home().to_string_lossy()),
            "XDG_DATA_HOME" => result.push_str(&self.xdg_data_home().to_string_lossy()),
            _ => {
                let value = env::var(var_name).map_err(|_| PathError::MissingEnvVar {
                    input: original.into(),
                    var: var_name.into(),
                })?;
                result.push_str(&value);
            }
        }
        Ok(())
    }
}

/// Resolves a path string using the system path resolver.
///
/// See [`PathResolver::resolve_path`] for detailed documentation.
pub fn resolve_path(path: &str) -> PathResult<PathBuf> {
    SystemPathResolver.resolve_path(path)
}

/// Returns the user's home directory using the system path resolver.
pub fn home_dir() -> PathBuf {
    SystemPathResolver.home_dir()
}

/// Returns the user's config directory using the system path resolver.
pub fn xdg_config_home() -> PathBuf {
    SystemPathResolver.xdg_config_home()
}

/// Returns the user's data directory using the system path resolver.
pub fn xdg_data_home() -> PathBuf {
    SystemPathResolver.xdg_data_home()
}

/// Splits a `:`-separated search path into resolved entries.
///
/// Empty entries are dropped, so `"a::b:"` yields two paths. Every remaining entry goes
/// through [`resolve_path`] and the first failure is returned.
///
/// # Example
///
/// ```
/// use keel_utils::path::split_search_path;
///
/// let roots = split_search_path("/opt/depot:/srv/depot").unwrap();
/// assert_eq!(roots.len(), 2);
/// ```
pub fn split_search_path(value: &str) -> PathResult<Vec<PathBuf>> {
    value
        .split(SEARCH_PATH_SEPARATOR)
        .filter(|entry| !entry.trim().is_empty())
        .map(resolve_path)
        .collect()
}

/// Returns `true` if `path` is a directory containing a file called `marker`.
pub fn dir_contains(path: &Path, marker: &str) -> bool {
    path.is_dir() && path.join(marker).is_file()
}
