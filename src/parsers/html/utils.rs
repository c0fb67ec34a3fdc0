/// ASCII 空白字符
pub const WHITESPACES: &[char] = &[' ', '\t', '\n', '\x0c', '\r'];

/// 其内部文本不属于可见文本的元素
pub const NON_VISIBLE_ELEMENTS: &[&str] = &["script", "style", "noscript"];

/// 已知的二进制文件签名
///
/// `.` 匹配任意字节。
const BINARY_SIGNATURES: &[&[u8]] = &[
    // Image
    b"GIF87a",
    b"GIF89a",
    b"\xFF\xD8\xFF",
    b"\x89PNG\x0D\x0A\x1A\x0A",
    b"RIFF....WEBPVP8 ",
    b"\x00\x00\x01\x00",
    // Audio
    b"ID3",
    b"OggS",
    b"fLaC",
    // Video
    b"....ftyp",
    b"\x1A\x45\xDF\xA3",
    // Archives and documents
    b"PK\x03\x04",
    b"\x1F\x8B",
    b"%PDF-",
];

/// 检查元素名是否属于不可见文本容器
pub fn is_non_visible_element(name: &str) -> bool {
    NON_VISIBLE_ELEMENTS.contains(&name)
}

/// 检查内容是否明显不是文本（更不是 HTML）
///
/// 命中已知二进制签名，或前 1024 字节中出现 NUL 字节，即视为二进制数据。
/// 残缺、未闭合或带有无效实体的标记不在此列。
pub fn looks_like_binary(data: &[u8]) -> bool {
    let matches_signature = BINARY_SIGNATURES.iter().any(|signature| {
        data.len() >= signature.len()
            && signature
                .iter()
                .zip(data.iter())
                .all(|(expected, actual)| *expected == b'.' || expected == actual)
    });

    matches_signature || data.iter().take(1024).any(|b| *b == 0)
}
