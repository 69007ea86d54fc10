// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory property bus.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{BusClient, BusValue};
use crate::error::BusError;

type Key = (String, String);

#[derive(Debug, Default)]
struct Inner {
    values: HashMap<Key, BusValue>,
    failing_reads: HashSet<Key>,
    failing_writes: HashSet<Key>,
    reads: Vec<Key>,
    writes: Vec<(String, String, i32)>,
}

/// Property bus backed by a hash map.
///
/// Clones share the same table, so a test can hand one handle to the
/// controller and keep another to change values and inspect writes.
///
/// Reading a property that was never set fails with
/// `BusError::PropertyNotFound`; properties marked with
/// [`fail_reads`](Self::fail_reads) fail with
/// `BusError::ServiceUnavailable` until [`restore_reads`](Self::restore_reads).
///
/// # Examples
///
/// ```
/// use acwh_switch::bus::{BusClient, BusValue, MemoryBus};
///
/// # async fn example() {
/// let bus = MemoryBus::new();
/// bus.set("com.victronenergy.system", "/Ac/ActiveIn/Source", 1);
///
/// let value = bus
///     .read_property("com.victronenergy.system", "/Ac/ActiveIn/Source")
///     .await
///     .unwrap();
/// assert_eq!(value, BusValue::Int(1));
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryBus {
    inner: Arc<Mutex<Inner>>,
}

fn key(service: &str, path: &str) -> Key {
    (service.to_string(), path.to_string())
}

impl MemoryBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets (or replaces) a property value.
    pub fn set(&self, service: &str, path: &str, value: impl Into<BusValue>) {
        self.inner
            .lock()
            .values
            .insert(key(service, path), value.into());
    }

    /// Removes a property so reads report it as not found.
    pub fn remove(&self, service: &str, path: &str) {
        self.inner.lock().values.remove(&key(service, path));
    }

    /// Returns the current value of a property.
    #[must_use]
    pub fn get(&self, service: &str, path: &str) -> Option<BusValue> {
        self.inner.lock().values.get(&key(service, path)).cloned()
    }

    /// Makes reads of a property fail as if the service were unreachable.
    pub fn fail_reads(&self, service: &str, path: &str) {
        self.inner.lock().failing_reads.insert(key(service, path));
    }

    /// Undoes [`fail_reads`](Self::fail_reads).
    pub fn restore_reads(&self, service: &str, path: &str) {
        self.inner.lock().failing_reads.remove(&key(service, path));
    }

    /// Makes writes to a property be rejected.
    pub fn fail_writes(&self, service: &str, path: &str) {
        self.inner.lock().failing_writes.insert(key(service, path));
    }

    /// Undoes [`fail_writes`](Self::fail_writes).
    pub fn restore_writes(&self, service: &str, path: &str) {
        self.inner.lock().failing_writes.remove(&key(service, path));
    }

    /// Returns every attempted write as `(service, path, value)`, oldest first.
    ///
    /// Rejected writes are recorded too.
    #[must_use]
    pub fn writes(&self) -> Vec<(String, String, i32)> {
        self.inner.lock().writes.clone()
    }

    /// Returns the number of reads of a property, failed ones included.
    #[must_use]
    pub fn read_count(&self, service: &str, path: &str) -> usize {
        let wanted = key(service, path);
        self.inner
            .lock()
            .reads
            .iter()
            .filter(|k| **k == wanted)
            .count()
    }
}

impl BusClient for MemoryBus {
    async fn read_property(&self, service: &str, path: &str) -> Result<BusValue, BusError> {
        let k = key(service, path);
        let mut inner = self.inner.lock();
        inner.reads.push(k.clone());

        if inner.failing_reads.contains(&k) {
            return Err(BusError::ServiceUnavailable(service.to_string()));
        }

        inner
            .values
            .get(&k)
            .cloned()
            .ok_or_else(|| BusError::PropertyNotFound {
                service: service.to_string(),
                path: path.to_string(),
            })
    }

    async fn write_property(
        &self,
        service: &str,
        path: &str,
        value: i32,
    ) -> Result<(), BusError> {
        let k = key(service, path);
        let mut inner = self.inner.lock();
        inner
            .writes
            .push((service.to_string(), path.to_string(), value));

        if inner.failing_writes.contains(&k) {
            return Err(BusError::WriteRejected {
                path: path.to_string(),
                code: -1,
            });
        }

        inner.values.insert(k, BusValue::from(value));
        Ok(())
    }
}
