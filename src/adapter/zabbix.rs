//! Zabbix media-type adapter
//!
//! Zabbix invokes the relay with three arguments: the PagerDuty service
//! key, the message subject (`trigger` or `resolve`) and a message body of
//! `key:value` lines:
//!
//! ```text
//! name:{TRIGGER.NAME}
//! id:{TRIGGER.ID}
//! status:{TRIGGER.STATUS}
//! hostname:{HOSTNAME}
//! ip:{IPADDRESS}
//! value:{TRIGGER.VALUE}
//! event_id:{EVENT.ID}
//! severity:{TRIGGER.SEVERITY}
//! ```

use eyre::Result;
use std::collections::BTreeMap;

use crate::event::{EventType, PagerDutyEvent};

pub struct ZabbixAlert {
    pub service_key: String,
    pub event_type: EventType,
    pub fields: BTreeMap<String, String>,
}

impl ZabbixAlert {
    pub fn parse(service_key: &str, subject: &str, body: &str) -> Result<Self> {
        let event_type = EventType::from_str(subject)
            .ok_or_else(|| eyre::eyre!("Unknown Zabbix subject '{}', expected trigger or resolve", subject.trim()))?;

        Ok(Self {
            service_key: service_key.to_string(),
            event_type,
            fields: parse_body(body),
        })
    }

    fn field(&self, key: &str) -> Result<&str> {
        self.fields
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| eyre::eyre!("Zabbix message body is missing '{}'", key))
    }

    /// Build the PagerDuty event
    ///
    /// The incident key is `<trigger id>-<hostname>` so a resolve lands on
    /// the incident its trigger opened.
    pub fn to_event(&self) -> Result<PagerDutyEvent> {
        let id = self.field("id")?;
        let hostname = self.field("hostname")?;
        let name = self.field("name")?;
        let status = self.field("status")?;

        Ok(PagerDutyEvent {
            service_key: self.service_key.clone(),
            event_type: self.event_type,
            description: format!("{} : {} for {}", name, status, hostname),
            incident_key: format!("{}-{}", id, hostname),
            details: serde_json::to_value(&self.fields)?,
        })
    }
}

/// Split each non-empty line on its first `:`
fn parse_body(body: &str) -> BTreeMap<String, String> {
    body.lines()
        .filter_map(|line| line.trim().split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}
