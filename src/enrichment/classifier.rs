use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use super::error::LookupError;

/// 地址分类结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub accepted: bool,
    /// 规范化后的地址（小写、压缩形式），拒绝时为空
    pub normalized: String,
    pub reason: Option<LookupError>,
}

impl Classification {
    fn accept(addr: IpAddr) -> Self {
        Self {
            accepted: true,
            normalized: addr.to_string(),
            reason: None,
        }
    }

    fn reject(reason: LookupError) -> Self {
        Self {
            accepted: false,
            normalized: String::new(),
            reason: Some(reason),
        }
    }

    /// 转换为 Result，便于在编排层使用 `?`
    pub fn into_result(self) -> Result<String, LookupError> {
        match self.reason {
            Some(reason) => Err(reason),
            None => Ok(self.normalized),
        }
    }
}

/// 保留 IPv4 网段：(网络地址, 前缀长度)
const RESERVED_V4: [(Ipv4Addr, u32); 6] = [
    (Ipv4Addr::new(0, 0, 0, 0), 8),
    (Ipv4Addr::new(10, 0, 0, 0), 8),
    (Ipv4Addr::new(127, 0, 0, 0), 8),
    (Ipv4Addr::new(169, 254, 0, 0), 16),
    (Ipv4Addr::new(172, 16, 0, 0), 12),
    (Ipv4Addr::new(192, 168, 0, 0), 16),
];

fn in_v4_block(addr: Ipv4Addr, network: Ipv4Addr, prefix: u32) -> bool {
    let mask = u32::MAX.checked_shl(32 - prefix).unwrap_or(0);
    u32::from(addr) & mask == u32::from(network) & mask
}

fn is_reserved_v4(addr: Ipv4Addr) -> bool {
    RESERVED_V4
        .iter()
        .any(|&(network, prefix)| in_v4_block(addr, network, prefix))
}

fn is_reserved_v6(addr: Ipv6Addr) -> bool {
    // ::ffff:a.b.c.d 按内嵌的 IPv4 地址判断
    if let Some(v4) = addr.to_ipv4_mapped() {
        return is_reserved_v4(v4);
    }
    // fe80::/10
    addr.is_loopback() || (addr.segments()[0] & 0xffc0) == 0xfe80
}

/// 校验并分类候选 IP 字符串，按顺序匹配，先命中者生效
pub fn classify(candidate: &str) -> Classification {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return Classification::reject(LookupError::InvalidFormat);
    }

    let addr = match candidate.parse::<IpAddr>() {
        Ok(addr) => addr,
        Err(_) => return Classification::reject(LookupError::InvalidFormat),
    };

    let reserved = match addr {
        IpAddr::V4(v4) => is_reserved_v4(v4),
        IpAddr::V6(v6) => is_reserved_v6(v6),
    };

    if reserved {
        Classification::reject(LookupError::PrivateAddress)
    } else {
        Classification::accept(addr)
    }
}
