//! Compatibility layer for rayon/sequential execution.
//!
//! With the `parallel` feature, work items are mapped on rayon's thread pool.
//! Without it (e.g. for WASM builds) the same call maps them in order on the
//! current thread.

#[cfg(feature = "parallel")]
pub(crate) fn par_map<I, R, F>(items: Vec<I>, f: F) -> Vec<R>
where
    I: Send,
    R: Send,
    F: Fn(I) -> R + Sync + Send,
{
    use rayon::prelude::*;
    items.into_par_iter().map(f).collect()
}

#[cfg(not(feature = "parallel"))]
pub(crate) fn par_map<I, R, F>(items: Vec<I>, f: F) -> Vec<R>
where
    F: Fn(I) -> R,
{
    items.into_iter().map(f).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_order() {
        let out = par_map((0..100).collect(), |x: i32| x * 2);
        assert_eq!(out, (0..100).map(|x| x * 2).collect::<Vec<_>>());
    }
}
