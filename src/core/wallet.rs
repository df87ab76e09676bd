//! 模拟钱包工具：地址生成、地址缩写、证书交易哈希

use rand::Rng;

const HEX: &[u8; 16] = b"0123456789abcdef";
/// 地址十六进制部分长度（不含 0x）
pub const ADDRESS_HEX_LEN: usize = 40;

/// 生成 `0x` + 40 位小写十六进制的伪随机地址，从不与任何网络校验
pub fn generate_address<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut addr = String::with_capacity(2 + ADDRESS_HEX_LEN);
    addr.push_str("0x");
    for _ in 0..ADDRESS_HEX_LEN {
        addr.push(HEX[rng.gen_range(0..16)] as char);
    }
    addr
}

/// 地址格式是否合法（Hydrate 时校验）
pub fn is_valid_address(addr: &str) -> bool {
    addr.len() == 2 + ADDRESS_HEX_LEN
        && addr.starts_with("0x")
        && addr[2..].bytes().all(|b| b.is_ascii_hexdigit())
}

/// 标题栏展示用：0x1234...abcd
pub fn short_address(addr: &str) -> String {
    match (addr.get(..6), addr.get(addr.len().saturating_sub(4)..)) {
        (Some(head), Some(tail)) if addr.len() > 10 => format!("{head}...{tail}"),
        _ => addr.to_string(),
    }
}

/// 奖励证书的装饰性交易哈希：0x + 地址第 2..10 位 + 毫秒时间戳十六进制末 4 位
pub fn certificate_tx_hash(address: &str, timestamp_millis: i64) -> String {
    let addr_part = address.get(2..10).unwrap_or("00000000");
    let ts_hex = format!("{:x}", timestamp_millis);
    let ts_part = &ts_hex[ts_hex.len().saturating_sub(4)..];
    format!("0x{addr_part}{ts_part}")
}
