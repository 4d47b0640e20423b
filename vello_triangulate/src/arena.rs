// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Index-addressed storage for the mesh.
//!
//! Vertices, edges and polygons reference each other through many intrusive lists, so they are
//! stored in typed pools and linked by stable indices. Nothing is freed until the whole arena is
//! dropped at the end of a triangulation.

use core::fmt::Debug;
use core::marker::PhantomData;
use core::ops::{Index, IndexMut};

/// The number of items a [`Pool`] can address.
pub(crate) const MAX_ITEMS: usize = u32::MAX as usize;

/// A stable index into a [`Pool`].
pub(crate) trait Id: Copy + Eq + Debug {
    fn new(index: usize) -> Self;
    fn index(self) -> usize;
}

macro_rules! define_id {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub(crate) struct $name(u32);

        impl $crate::arena::Id for $name {
            #[inline(always)]
            fn new(index: usize) -> Self {
                debug_assert!(index <= $crate::arena::MAX_ITEMS, "arena index overflow");
                Self(index as u32)
            }

            #[inline(always)]
            fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

pub(crate) use define_id;

/// Append-only typed storage.
#[derive(Debug)]
pub(crate) struct Pool<I, T> {
    items: Vec<T>,
    _id: PhantomData<fn(I) -> I>,
}

impl<I: Id, T> Pool<I, T> {
    pub(crate) fn new() -> Self {
        Self {
            items: Vec::new(),
            _id: PhantomData,
        }
    }

    pub(crate) fn push(&mut self, item: T) -> I {
        let id = I::new(self.items.len());
        self.items.push(item);
        id
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }
}

impl<I: Id, T> Default for Pool<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Id, T> Index<I> for Pool<I, T> {
    type Output = T;

    #[inline(always)]
    fn index(&self, id: I) -> &T {
        &self.items[id.index()]
    }
}

impl<I: Id, T> IndexMut<I> for Pool<I, T> {
    #[inline(always)]
    fn index_mut(&mut self, id: I) -> &mut T {
        &mut self.items[id.index()]
    }
}

/// The neighbours of an element in one intrusive list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Links<I> {
    pub prev: Option<I>,
    pub next: Option<I>,
}

impl<I> Links<I> {
    pub(crate) const NONE: Self = Self {
        prev: None,
        next: None,
    };
}

/// The ends of an intrusive list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct List<I> {
    pub head: Option<I>,
    pub tail: Option<I>,
}

impl<I> List<I> {
    pub(crate) const EMPTY: Self = Self {
        head: None,
        tail: None,
    };

    pub(crate) fn is_empty(&self) -> bool {
        self.head.is_none()
    }
}

impl<I> Default for List<I> {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Accessor for the links of one particular list an element can be in.
pub(crate) type LinksOf<I, T> = fn(&mut T) -> &mut Links<I>;

/// Link `t` between `prev` and `next`, updating the list ends when either is absent.
pub(crate) fn list_insert<I: Id, T>(
    pool: &mut Pool<I, T>,
    links: LinksOf<I, T>,
    t: I,
    prev: Option<I>,
    next: Option<I>,
    list: &mut List<I>,
) {
    *links(&mut pool[t]) = Links { prev, next };
    match prev {
        Some(p) => links(&mut pool[p]).next = Some(t),
        None => list.head = Some(t),
    }
    match next {
        Some(n) => links(&mut pool[n]).prev = Some(t),
        None => list.tail = Some(t),
    }
}

/// Unlink `t` from the list.
pub(crate) fn list_remove<I: Id, T>(
    pool: &mut Pool<I, T>,
    links: LinksOf<I, T>,
    t: I,
    list: &mut List<I>,
) {
    let Links { prev, next } = *links(&mut pool[t]);
    match prev {
        Some(p) => links(&mut pool[p]).next = next,
        None => list.head = next,
    }
    match next {
        Some(n) => links(&mut pool[n]).prev = prev,
        None => list.tail = prev,
    }
    *links(&mut pool[t]) = Links::NONE;
}
