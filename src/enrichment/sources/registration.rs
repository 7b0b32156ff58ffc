use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::Value;

use super::{RegistrationInfo, RegistrationSource, SourceError, fetch_json, join_non_empty};

/// RDAP 原始响应，只保留用到的部分
///
/// 实体和 vCard 的嵌套结构各家注册局并不统一，保留为 `Value` 再逐层取值。
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RdapResponse {
    name: Option<String>,
    entities: Value,
}

/// 实体上的 vCard 属性列表：vcardArray = ["vcard", [[name, params, type, value...], ...]]
fn vcard_properties(entity: &Value) -> &[Value] {
    entity
        .get("vcardArray")
        .and_then(|v| v.get(1))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn vcard_property<'a>(entity: &'a Value, name: &str) -> Option<&'a Value> {
    vcard_properties(entity)
        .iter()
        .find(|prop| prop.get(0).and_then(Value::as_str) == Some(name))
}

fn vcard_fn(entity: &Value) -> Option<String> {
    vcard_property(entity, "fn")
        .and_then(|prop| prop.get(3))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// 地址优先取 label 参数，否则拼接结构化地址的各个分量
fn vcard_address(entity: &Value) -> String {
    let Some(adr) = vcard_property(entity, "adr") else {
        return String::new();
    };

    if let Some(label) = adr
        .get(1)
        .and_then(|params| params.get("label"))
        .and_then(Value::as_str)
    {
        let joined = join_non_empty(label.lines());
        if !joined.is_empty() {
            return joined;
        }
    }

    let mut parts = Vec::new();
    if let Some(components) = adr.get(3).and_then(Value::as_array) {
        for component in components {
            match component {
                Value::String(s) => parts.push(s.as_str()),
                Value::Array(items) => parts.extend(items.iter().filter_map(Value::as_str)),
                _ => {}
            }
        }
    }
    join_non_empty(parts)
}

fn has_role(entity: &Value, role: &str) -> bool {
    entity
        .get("roles")
        .and_then(Value::as_array)
        .is_some_and(|roles| roles.iter().any(|r| r.as_str() == Some(role)))
}

/// 深度优先展开所有实体（含嵌套实体）
fn flatten_entities<'a>(entities: &'a Value, out: &mut Vec<&'a Value>) {
    if let Some(list) = entities.as_array() {
        for entity in list {
            out.push(entity);
            if let Some(nested) = entity.get("entities") {
                flatten_entities(nested, out);
            }
        }
    }
}

impl RdapResponse {
    fn into_info(self) -> RegistrationInfo {
        let mut entities = Vec::new();
        flatten_entities(&self.entities, &mut entities);

        let chosen = entities
            .iter()
            .find(|e| has_role(e, "registrant") && vcard_fn(e).is_some())
            .or_else(|| entities.iter().find(|e| vcard_fn(e).is_some()));

        match chosen {
            Some(entity) => RegistrationInfo {
                org: vcard_fn(entity).unwrap_or_default(),
                address: vcard_address(entity),
            },
            None => RegistrationInfo {
                org: self.name.map(|n| n.trim().to_string()).unwrap_or_default(),
                address: String::new(),
            },
        }
    }
}

/// WHOIS（RDAP）数据源
pub struct RdapSource {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl RdapSource {
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl RegistrationSource for RdapSource {
    async fn lookup(&self, ip: &str) -> Result<RegistrationInfo, SourceError> {
        let request = self
            .client
            .get(format!("{}/{}", self.base_url, ip))
            .header(ACCEPT, "application/rdap+json, application/json")
            .timeout(self.timeout);

        let raw: RdapResponse = fetch_json(request).await?;
        Ok(raw.into_info())
    }
}
