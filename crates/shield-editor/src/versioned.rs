// -------------------------------------------------------------------
// Versioned
// -------------------------------------------------------------------

/// Value with a counter bumped on every mutable access, so readers can
/// poll for changes.
#[derive(Debug, Clone, Default)]
pub struct Versioned<T> {
    version: u64,
    data: T,
}

impl<T> Versioned<T> {
    pub fn new(data: T) -> Self {
        Self { version: 0, data }
    }
    pub fn get(&self) -> &T {
        &self.data
    }
    pub fn get_mut(&mut self) -> &mut T {
        self.version = self.version.wrapping_add(1);
        &mut self.data
    }
    pub fn set(&mut self, data: T) {
        self.data = data;
        self.version = self.version.wrapping_add(1);
    }
    pub fn version(&self) -> u64 {
        self.version
    }
}

// -------------------------------------------------------------------
// Memoized
// -------------------------------------------------------------------

/// Value derived from `S`, recomputed only when its key changes.
pub struct Memoized<S, K, V> {
    version: u64,
    cached: Option<(K, V)>,
    get_key: Box<dyn Fn(&S) -> K>,
    calc: Box<dyn Fn(&S) -> V>,
}

impl<S, K, V> Memoized<S, K, V>
where
    K: PartialEq,
{
    pub fn new(
        get_key: impl Fn(&S) -> K + 'static,
        calc: impl Fn(&S) -> V + 'static,
    ) -> Self {
        Self {
            version: 0,
            cached: None,
            get_key: Box::new(get_key),
            calc: Box::new(calc),
        }
    }

    /// Recompute only if the key changed; return a reference to the
    /// cached value.
    pub fn get<'a>(&'a mut self, store: &S) -> &'a V {
        let key = (self.get_key)(store);
        let stale = match &self.cached {
            Some((k, _)) => *k != key,
            None => true,
        };
        if stale {
            self.cached = None;
            self.version = self.version.wrapping_add(1);
        }
        let calc = &self.calc;
        let (_, value) =
            self.cached.get_or_insert_with(|| (key, calc(store)));
        value
    }

    /// Drops the cached value so the next `get` recomputes.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// Incremented each time the value is recomputed.
    pub fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_versioned_bumps_on_mutation() {
        let mut v = Versioned::new(1);
        assert_eq!(v.version(), 0);
        *v.get_mut() += 1;
        v.set(10);
        assert_eq!(*v.get(), 10);
        assert_eq!(v.version(), 2);
    }

    #[test]
    fn test_memoized_recomputes_on_key_change() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut doubled = Memoized::new(
            |s: &Versioned<i32>| s.version(),
            move |s: &Versioned<i32>| {
                counter.set(counter.get() + 1);
                s.get() * 2
            },
        );

        let mut source = Versioned::new(4);
        assert_eq!(*doubled.get(&source), 8);
        assert_eq!(*doubled.get(&source), 8);
        assert_eq!(calls.get(), 1);

        source.set(5);
        assert_eq!(*doubled.get(&source), 10);
        assert_eq!(calls.get(), 2);
        assert_eq!(doubled.version(), 2);

        doubled.invalidate();
        doubled.get(&source);
        assert_eq!(calls.get(), 3);
    }
}
