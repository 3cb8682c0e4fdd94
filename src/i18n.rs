// ==========================================
// 生产日志看板 - 界面文本
// ==========================================
// 文案位于 locales/{zh-CN,en}.yml，默认中文
// rust_i18n::i18n! 宏在 lib.rs 中加载
// ==========================================

use crate::domain::types::{Shift, SyncStatus};

/// 切换语言（"zh-CN" / "en"），未知语言回退到中文文案
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译并替换 %{name} 占位符
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    args.iter().fold(t(key), |text, (name, value)| {
        text.replace(&format!("%{{{}}}", name), value)
    })
}

/// 同步状态显示文本
pub fn status_label(status: SyncStatus) -> String {
    t(&format!("sync_status.{}", status.as_str()))
}

/// 班次显示文本
pub fn shift_label(shift: Shift) -> String {
    t(&format!("shift.{}", shift.as_str().to_ascii_lowercase()))
}
