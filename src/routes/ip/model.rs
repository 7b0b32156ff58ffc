use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct IpQuery {
    /// 缺失时按非法地址处理
    #[serde(default)]
    pub ip: Option<String>,
}
