/// Runs `f` with `vars` set and `unset` removed, restoring the previous values after.
///
/// Callers mutate process-wide state and must be `#[serial]`.
#[cfg(test)]
pub fn with_env<F>(vars: Vec<(&str, &str)>, unset: &[&str], f: F)
where
    F: FnOnce(),
{
    let old_vars: Vec<_> = vars
        .iter()
        .map(|(k, _)| *k)
        .chain(unset.iter().copied())
        .map(|k| (k, std::env::var(k).ok()))
        .collect();

    for key in unset {
        std::env::remove_var(key);
    }
    for (key, value) in &vars {
        std::env::set_var(key, value);
    }

    f();

    for (key, old_value) in old_vars {
        match old_value {
            Some(v) => std::env::set_var(key, v),
            None => std::env::remove_var(key),
        }
    }
}
