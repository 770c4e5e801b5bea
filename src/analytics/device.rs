//! User-Agent based device classification

use woothee::parser::Parser;

use super::DeviceType;

const BOT_KEYWORDS: &[&str] = &["bot", "crawler", "spider", "scraper", "curl", "wget"];
const TABLET_KEYWORDS: &[&str] = &["tablet", "ipad"];
const MOBILE_KEYWORDS: &[&str] = &[
    "mobile",
    "android",
    "iphone",
    "ipod",
    "blackberry",
    "windows phone",
];
const DESKTOP_KEYWORDS: &[&str] = &["mozilla", "windows", "macintosh"];

/// 根据 User-Agent 判断设备类型
///
/// 先做关键字匹配；tablet 在 mobile 之前判断（iPad 的 UA 同样带有 "Mobile"）。
/// 关键字都不命中时交给 woothee 按类别兜底。
pub fn detect_device_type(user_agent: &str) -> DeviceType {
    let ua = user_agent.to_lowercase();
    let contains_any = |keywords: &[&str]| keywords.iter().any(|k| ua.contains(k));

    if contains_any(BOT_KEYWORDS) {
        return DeviceType::Bot;
    }
    if contains_any(TABLET_KEYWORDS) {
        return DeviceType::Tablet;
    }
    if contains_any(MOBILE_KEYWORDS) {
        return DeviceType::Mobile;
    }
    if contains_any(DESKTOP_KEYWORDS) {
        return DeviceType::Desktop;
    }

    classify_with_woothee(user_agent)
}

fn classify_with_woothee(user_agent: &str) -> DeviceType {
    let Some(result) = Parser::new().parse(user_agent) else {
        return DeviceType::Unknown;
    };

    match result.category {
        "crawler" => DeviceType::Bot,
        "smartphone" | "mobilephone" => DeviceType::Mobile,
        "pc" => DeviceType::Desktop,
        _ => DeviceType::Unknown,
    }
}
