//! # Id 模块
//!
//! 不透明字符串 id 的生成。
//!
//! id 由毫秒时间戳和随机数各自的 36 进制表示拼接而成，
//! 只包含 `[0-9a-z]`，可以安全地用作文件名。

use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

/// 生成一个新的不透明 id
pub fn generate_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let salt: u64 = rand::thread_rng().r#gen();

    format!("{}{}", to_base36(millis), to_base36(salt))
}

/// 无符号整数的 36 进制表示（小写）
fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut buf = Vec::new();
    while value > 0 {
        buf.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    buf.reverse();

    String::from_utf8(buf).unwrap_or_default()
}
