// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! D-Bus client for Venus OS bus items.

use zbus::zvariant::{OwnedValue, Value};
use zbus::{Connection, Proxy};

use super::{BUS_ITEM_INTERFACE, BusClient, BusValue};
use crate::error::BusError;

/// Bus client talking to Venus OS services over the system bus.
///
/// Every property is an object implementing `com.victronenergy.BusItem`;
/// reads call `GetValue`, writes call `SetValue` with an `int32` variant.
///
/// # Examples
///
/// ```no_run
/// use acwh_switch::bus::{BusClient, DbusClient};
///
/// # async fn example() -> Result<(), acwh_switch::error::BusError> {
/// let bus = DbusClient::system().await?;
/// let source = bus
///     .read_property("com.victronenergy.system", "/Ac/ActiveIn/Source")
///     .await?;
/// println!("source = {source}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DbusClient {
    connection: Connection,
}

impl DbusClient {
    /// Connects to the system bus.
    ///
    /// # Errors
    ///
    /// Returns `BusError::DBus` if the system bus is not reachable.
    pub async fn system() -> Result<Self, BusError> {
        let connection = Connection::system().await?;
        tracing::debug!("Connected to D-Bus system bus");
        Ok(Self { connection })
    }

    /// Wraps an existing connection.
    #[must_use]
    pub fn with_connection(connection: Connection) -> Self {
        Self { connection }
    }

    async fn bus_item(&self, service: &str, path: &str) -> Result<Proxy<'static>, BusError> {
        let proxy = Proxy::new(
            &self.connection,
            service.to_string(),
            path.to_string(),
            BUS_ITEM_INTERFACE,
        )
        .await?;
        Ok(proxy)
    }
}

/// Maps well-known D-Bus failures onto the bus error taxonomy.
fn classify_error(err: zbus::Error, service: &str, path: &str) -> BusError {
    if let zbus::Error::MethodError(name, _, _) = &err {
        match name.as_str() {
            "org.freedesktop.DBus.Error.ServiceUnknown"
            | "org.freedesktop.DBus.Error.NameHasNoOwner" => {
                return BusError::ServiceUnavailable(service.to_string());
            }
            "org.freedesktop.DBus.Error.UnknownObject"
            | "org.freedesktop.DBus.Error.UnknownMethod" => {
                return BusError::PropertyNotFound {
                    service: service.to_string(),
                    path: path.to_string(),
                };
            }
            _ => {}
        }
    }
    BusError::DBus(err)
}

fn to_bus_value(value: &Value<'_>, path: &str) -> Result<BusValue, BusError> {
    let converted = match value {
        Value::U8(v) => BusValue::Int(i64::from(*v)),
        Value::I16(v) => BusValue::Int(i64::from(*v)),
        Value::U16(v) => BusValue::Int(i64::from(*v)),
        Value::I32(v) => BusValue::Int(i64::from(*v)),
        Value::U32(v) => BusValue::Int(i64::from(*v)),
        Value::I64(v) => BusValue::Int(*v),
        Value::U64(v) => {
            BusValue::Int(i64::try_from(*v).map_err(|_| BusError::InvalidValue {
                path: path.to_string(),
                message: format!("unsigned value {v} does not fit in i64"),
            })?)
        }
        Value::Bool(v) => BusValue::Int(i64::from(*v)),
        Value::F64(v) => BusValue::Double(*v),
        Value::Str(s) => BusValue::Text(s.to_string()),
        // Venus OS publishes an invalid (unset) item as an empty array.
        Value::Array(items) if items.is_empty() => BusValue::Empty,
        Value::Value(inner) => return to_bus_value(inner, path),
        other => {
            return Err(BusError::InvalidValue {
                path: path.to_string(),
                message: format!("unsupported variant signature {}", other.value_signature()),
            });
        }
    };
    Ok(converted)
}

impl BusClient for DbusClient {
    async fn read_property(&self, service: &str, path: &str) -> Result<BusValue, BusError> {
        let proxy = self.bus_item(service, path).await?;
        let value: OwnedValue = proxy
            .call("GetValue", &())
            .await
            .map_err(|e| classify_error(e, service, path))?;

        tracing::trace!(service, path, "GetValue");
        to_bus_value(&value, path)
    }

    async fn write_property(
        &self,
        service: &str,
        path: &str,
        value: i32,
    ) -> Result<(), BusError> {
        let proxy = self.bus_item(service, path).await?;
        let code: i32 = proxy
            .call("SetValue", &(Value::from(value),))
            .await
            .map_err(|e| classify_error(e, service, path))?;

        tracing::trace!(service, path, value, code, "SetValue");
        if code != 0 {
            return Err(BusError::WriteRejected {
                path: path.to_string(),
                code,
            });
        }
        Ok(())
    }
}
