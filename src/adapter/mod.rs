//! Adapters from monitoring tools to PagerDuty events

pub mod zabbix;

pub use zabbix::ZabbixAlert;
