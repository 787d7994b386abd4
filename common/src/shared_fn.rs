use std::sync::Arc;

/// Callback that may be absent, shared by reference count so render workers
/// can each hold a handle to the same closure.
pub enum SharedFn<F: ?Sized + Send + Sync + 'static> {
    None,
    Some(Arc<F>),
}

impl<F: ?Sized + Send + Sync + 'static> Clone for SharedFn<F> {
    fn clone(&self) -> Self {
        match self {
            SharedFn::None => SharedFn::None,
            SharedFn::Some(f) => SharedFn::Some(Arc::clone(f)),
        }
    }
}

impl<F: ?Sized + Send + Sync + 'static> Default for SharedFn<F> {
    fn default() -> Self {
        SharedFn::None
    }
}

impl<F: ?Sized + Send + Sync + 'static> SharedFn<F> {
    /// The callback, if one is set.
    pub fn as_ref(&self) -> Option<&F> {
        match self {
            SharedFn::None => None,
            SharedFn::Some(f) => Some(f.as_ref()),
        }
    }
}
