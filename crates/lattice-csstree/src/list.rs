//! Doubly linked list used for every CST `children` collection.
//!
//! Items live in a [`SlotMap`] and are addressed by [`ItemId`]. Iterations
//! started through [`List::each`] and friends register a cursor; every
//! structural edit redirects the cursors standing next to the edited item, so
//! a traversal that removes or inserts items while it runs never skips or
//! revisits an element, even when traversals of the same list are nested.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle of an item stored in a [`List`].
    pub struct ItemId;
}

#[derive(Clone)]
struct Item<T> {
    prev: Option<ItemId>,
    next: Option<ItemId>,
    linked: bool,
    data: T,
}

#[derive(Debug, Clone, Copy, Default)]
struct Cursor {
    prev: Option<ItemId>,
    next: Option<ItemId>,
}

/// Content that takes the place of an item in [`List::replace`].
pub enum Replacement<T> {
    /// A single value.
    Data(T),
    /// All items of another list, in order.
    List(List<T>),
}

/// Ordered sequence with O(1) insertion and removal at known positions.
pub struct List<T> {
    items: SlotMap<ItemId, Item<T>>,
    head: Option<ItemId>,
    tail: Option<ItemId>,
    size: usize,
    cursors: Vec<Cursor>,
    active_cursors: usize,
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> List<T> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self {
            items: SlotMap::with_key(),
            head: None,
            tail: None,
            size: 0,
            cursors: Vec::new(),
            active_cursors: 0,
        }
    }

    /// Build a list from a vector, keeping its order.
    pub fn from_vec(values: Vec<T>) -> Self {
        values.into_iter().collect()
    }

    /// Consume the list and return its values in order.
    pub fn into_vec(mut self) -> Vec<T> {
        let mut result = Vec::with_capacity(self.size);

        while let Some(value) = self.shift() {
            result.push(value);
        }

        result
    }

    /// Number of linked items.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn head(&self) -> Option<ItemId> {
        self.head
    }

    pub fn tail(&self) -> Option<ItemId> {
        self.tail
    }

    /// Data of the first item.
    pub fn first(&self) -> Option<&T> {
        self.head.and_then(|id| self.get(id))
    }

    /// Data of the last item.
    pub fn last(&self) -> Option<&T> {
        self.tail.and_then(|id| self.get(id))
    }

    pub fn first_mut(&mut self) -> Option<&mut T> {
        let head = self.head?;
        self.get_mut(head)
    }

    pub fn last_mut(&mut self) -> Option<&mut T> {
        let tail = self.tail?;
        self.get_mut(tail)
    }

    pub fn get(&self, id: ItemId) -> Option<&T> {
        self.items.get(id).map(|item| &item.data)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut T> {
        self.items.get_mut(id).map(|item| &mut item.data)
    }

    /// Whether `id` refers to an item currently linked into this list.
    pub fn contains(&self, id: ItemId) -> bool {
        self.items.get(id).is_some_and(|item| item.linked)
    }

    pub fn next_of(&self, id: ItemId) -> Option<ItemId> {
        self.items.get(id).and_then(|item| item.next)
    }

    pub fn prev_of(&self, id: ItemId) -> Option<ItemId> {
        self.items.get(id).and_then(|item| item.prev)
    }

    /// Item ids in list order.
    pub fn ids(&self) -> Vec<ItemId> {
        let mut result = Vec::with_capacity(self.size);
        let mut cursor = self.head;

        while let Some(id) = cursor {
            result.push(id);
            cursor = self.next_of(id);
        }

        result
    }

    /// Iterate values in order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            front: self.head,
            back: self.tail,
            remaining: self.size,
        }
    }

    /// Apply `f` to every value in order.
    pub fn for_each_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut T),
    {
        let mut cursor = self.head;

        while let Some(id) = cursor {
            cursor = self.next_of(id);
            if let Some(data) = self.get_mut(id) {
                f(data);
            }
        }
    }

    /// Whether any value satisfies `predicate`.
    pub fn some<F>(&self, predicate: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        self.iter().any(predicate)
    }

    /// New list with `f` applied to every value.
    pub fn map<U, F>(&self, f: F) -> List<U>
    where
        F: FnMut(&T) -> U,
    {
        self.iter().map(f).collect()
    }

    /// Remove every item.
    pub fn clear(&mut self) {
        self.items.clear();
        self.head = None;
        self.tail = None;
        self.size = 0;

        for cursor in &mut self.cursors[..self.active_cursors] {
            *cursor = Cursor::default();
        }
    }

    // cursors

    fn allocate_cursor(&mut self, prev: Option<ItemId>, next: Option<ItemId>) -> usize {
        let index = self.active_cursors;
        let cursor = Cursor { prev, next };

        if index == self.cursors.len() {
            self.cursors.push(cursor);
        } else {
            self.cursors[index] = cursor;
        }

        self.active_cursors += 1;
        index
    }

    fn release_cursor(&mut self) {
        self.active_cursors -= 1;
    }

    fn update_cursors(
        &mut self,
        prev_old: Option<ItemId>,
        prev_new: Option<ItemId>,
        next_old: Option<ItemId>,
        next_new: Option<ItemId>,
    ) {
        for cursor in &mut self.cursors[..self.active_cursors] {
            if cursor.prev == prev_old {
                cursor.prev = prev_new;
            }

            if cursor.next == next_old {
                cursor.next = next_new;
            }
        }
    }

    /// Number of traversals currently in progress.
    pub fn active_cursors(&self) -> usize {
        self.active_cursors
    }

    // traversal

    /// Visit every item front to back. `f` may mutate the list.
    pub fn each<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut List<T>, ItemId),
    {
        let cursor = self.allocate_cursor(None, self.head);

        while let Some(id) = self.cursors[cursor].next {
            self.cursors[cursor].next = self.next_of(id);
            f(self, id);
        }

        self.release_cursor();
    }

    /// Visit every item back to front. `f` may mutate the list.
    pub fn each_right<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut List<T>, ItemId),
    {
        let cursor = self.allocate_cursor(self.tail, None);

        while let Some(id) = self.cursors[cursor].prev {
            self.cursors[cursor].prev = self.prev_of(id);
            f(self, id);
        }

        self.release_cursor();
    }

    /// Visit items from `start` forward until `f` returns `true`.
    pub fn next_until<F>(&mut self, start: Option<ItemId>, mut f: F)
    where
        F: FnMut(&mut List<T>, ItemId) -> bool,
    {
        let Some(start) = start else { return };
        let cursor = self.allocate_cursor(None, Some(start));

        while let Some(id) = self.cursors[cursor].next {
            self.cursors[cursor].next = self.next_of(id);

            if f(self, id) {
                break;
            }
        }

        self.release_cursor();
    }

    /// Visit items from `start` backward until `f` returns `true`.
    pub fn prev_until<F>(&mut self, start: Option<ItemId>, mut f: F)
    where
        F: FnMut(&mut List<T>, ItemId) -> bool,
    {
        let Some(start) = start else { return };
        let cursor = self.allocate_cursor(Some(start), None);

        while let Some(id) = self.cursors[cursor].prev {
            self.cursors[cursor].prev = self.prev_of(id);

            if f(self, id) {
                break;
            }
        }

        self.release_cursor();
    }

    // mutation

    /// Store `data` as a detached item ready for [`List::insert`].
    pub fn create_item(&mut self, data: T) -> ItemId {
        self.items.insert(Item {
            prev: None,
            next: None,
            linked: false,
            data,
        })
    }

    /// Link a detached item before `before`, or at the end when `before` is
    /// `None`. Returns `false` when `item` is unknown or already linked, or
    /// when `before` is not part of the list.
    pub fn insert(&mut self, item: ItemId, before: Option<ItemId>) -> bool {
        if !self.items.get(item).is_some_and(|item| !item.linked) {
            return false;
        }

        match before {
            Some(before) => {
                if !self.contains(before) {
                    return false;
                }

                let before_prev = self.prev_of(before);
                self.update_cursors(before_prev, Some(item), Some(before), Some(item));

                match before_prev {
                    None => self.head = Some(item),
                    Some(prev) => self.items[prev].next = Some(item),
                }

                self.items[item].prev = before_prev;
                self.items[item].next = Some(before);
                self.items[before].prev = Some(item);
            }
            None => {
                self.update_cursors(self.tail, Some(item), None, Some(item));

                match self.tail {
                    Some(tail) => {
                        self.items[tail].next = Some(item);
                        self.items[item].prev = Some(tail);
                    }
                    None => self.head = Some(item),
                }

                self.tail = Some(item);
            }
        }

        self.items[item].linked = true;
        self.size += 1;
        true
    }

    /// Insert `data` before `before` (or at the end) and return its id.
    pub fn insert_data(&mut self, data: T, before: Option<ItemId>) -> ItemId {
        let item = self.create_item(data);

        if !self.insert(item, before) {
            // unknown anchor: append instead of losing the value
            self.insert(item, None);
        }

        item
    }

    /// Link a detached item at the front.
    pub fn prepend(&mut self, item: ItemId) -> bool {
        self.insert(item, self.head)
    }

    pub fn prepend_data(&mut self, data: T) -> ItemId {
        self.insert_data(data, self.head)
    }

    /// Link a detached item at the end.
    pub fn append(&mut self, item: ItemId) -> bool {
        self.insert(item, None)
    }

    pub fn append_data(&mut self, data: T) -> ItemId {
        self.insert_data(data, None)
    }

    /// Unlink an item and return its data.
    pub fn remove(&mut self, item: ItemId) -> Option<T> {
        if !self.contains(item) {
            return self.items.remove(item).map(|item| item.data);
        }

        let prev = self.prev_of(item);
        let next = self.next_of(item);
        self.update_cursors(Some(item), prev, Some(item), next);

        match prev {
            Some(prev) => self.items[prev].next = next,
            None => self.head = next,
        }

        match next {
            Some(next) => self.items[next].prev = prev,
            None => self.tail = prev,
        }

        self.size -= 1;
        self.items.remove(item).map(|item| item.data)
    }

    /// Append a value.
    pub fn push(&mut self, data: T) -> ItemId {
        self.append_data(data)
    }

    /// Remove and return the last value.
    pub fn pop(&mut self) -> Option<T> {
        let tail = self.tail?;
        self.remove(tail)
    }

    /// Prepend a value.
    pub fn unshift(&mut self, data: T) -> ItemId {
        self.prepend_data(data)
    }

    /// Remove and return the first value.
    pub fn shift(&mut self) -> Option<T> {
        let head = self.head?;
        self.remove(head)
    }

    /// Move every item of `list` before `before` (or to the end).
    pub fn insert_list(&mut self, list: List<T>, before: Option<ItemId>) {
        let before = before.filter(|&id| self.contains(id));

        for data in list.into_vec() {
            self.insert_data(data, before);
        }
    }

    pub fn prepend_list(&mut self, list: List<T>) {
        let head = self.head;
        self.insert_list(list, head);
    }

    pub fn append_list(&mut self, list: List<T>) {
        self.insert_list(list, None);
    }

    /// Put `with` in place of `old` and return the old data.
    pub fn replace(&mut self, old: ItemId, with: Replacement<T>) -> Option<T> {
        if !self.contains(old) {
            return None;
        }

        match with {
            Replacement::Data(data) => {
                self.insert_data(data, Some(old));
            }
            Replacement::List(list) => self.insert_list(list, Some(old)),
        }

        self.remove(old)
    }
}

impl<T: Clone> List<T> {
    /// Values in order.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    /// New list holding the values that satisfy `predicate`.
    pub fn filter<F>(&self, mut predicate: F) -> List<T>
    where
        F: FnMut(&T) -> bool,
    {
        self.iter().filter(|value| predicate(value)).cloned().collect()
    }

    /// Shallow copy with fresh item ids.
    pub fn copy(&self) -> List<T> {
        self.iter().cloned().collect()
    }
}

impl<T: Clone> Clone for List<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            head: self.head,
            tail: self.tail,
            size: self.size,
            cursors: Vec::new(),
            active_cursors: 0,
        }
    }
}

impl<T: PartialEq> PartialEq for List<T> {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.iter().eq(other.iter())
    }
}

impl<T: fmt::Debug> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> FromIterator<T> for List<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = List::new();

        for value in iter {
            list.push(value);
        }

        list
    }
}

impl<T> Extend<T> for List<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl<'a, T> IntoIterator for &'a List<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Serialize> Serialize for List<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for List<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(List::from_vec)
    }
}

/// Borrowing iterator over list values.
pub struct Iter<'a, T> {
    list: &'a List<T>,
    front: Option<ItemId>,
    back: Option<ItemId>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let id = self.front?;
        let item = self.list.items.get(id)?;
        self.front = item.next;
        self.remaining -= 1;
        Some(&item.data)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let id = self.back?;
        let item = self.list.items.get(id)?;
        self.back = item.prev;
        self.remaining -= 1;
        Some(&item.data)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
