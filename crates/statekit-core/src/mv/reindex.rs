//! Contiguous renumbering of list-mode instances
//!
//! Every structural change that leaves a list-mode resource holding both
//! pre-existing and newly arrived instances ends with [`reindex`]. Entries are
//! ordered by their [`ListSlot`] and renumbered `0..N`.

use crate::addrs::InstanceKey;

/// Whether an entry was already under the resource or is being moved in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Arrival {
    Existing,
    Incoming,
}

/// Sort position of one list entry before renumbering.
///
/// Entries sort by pass, then numerically by original key, then existing
/// before incoming. Appended entries use a later pass so they follow every
/// entry of the first pass regardless of their keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct ListSlot {
    pass: u8,
    key: i64,
    arrival: Arrival,
}

impl ListSlot {
    /// An instance already present at `key`.
    pub(crate) fn existing(key: i64) -> Self {
        Self {
            pass: 0,
            key,
            arrival: Arrival::Existing,
        }
    }

    /// A single moved instance placed at `key` among the existing ones.
    pub(crate) fn inserted(key: i64) -> Self {
        Self {
            pass: 0,
            key,
            arrival: Arrival::Incoming,
        }
    }

    /// An instance of a moved resource, appended after the existing ones.
    pub(crate) fn appended(key: i64) -> Self {
        Self {
            pass: 1,
            key,
            arrival: Arrival::Incoming,
        }
    }
}

/// Renumber entries `0..N` in slot order.
///
/// The sort is stable, so entries with equal slots keep their input order.
pub(crate) fn reindex<T>(mut entries: Vec<(ListSlot, T)>) -> Vec<(InstanceKey, T)> {
    entries.sort_by_key(|(slot, _)| *slot);
    entries
        .into_iter()
        .zip(0_i64..)
        .map(|((_, value), index)| (InstanceKey::Int(index), value))
        .collect()
}
