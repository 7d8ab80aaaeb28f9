//! User-facing message text. The bot speaks Vietnamese regardless of the
//! user's summary-language preference; only the summaries themselves follow
//! it.

use clip_datastore::{Channel, Platform, Video};

use crate::service::{LanguageError, SubscribeError, UnsubscribeError};

/// Title recorded for fetched videos whose title could not be scraped.
pub const PLACEHOLDER_TITLE: &str = "Video mới";

pub const INVALID_LINK: &str = "❌ Link không hợp lệ.";

pub const HELP: &str = "🤖 *HƯỚNG DẪN SỬ DỤNG BOT TÓM TẮT VIDEO*\n\n\
    1️⃣ Gửi link video YouTube, TikTok hoặc Facebook cần tóm tắt\n\
    2️⃣ Bot sẽ tự động nhận diện loại video và xử lý\n\
    3️⃣ Đối với YouTube: Bot sẽ trích xuất phụ đề (chủ yếu tiếng Việt)\n\
    4️⃣ Bot sẽ tóm tắt nội dung\n\
    5️⃣ Kết quả tóm tắt sẽ được gửi lại cho bạn\n\n\
    *Tính năng theo dõi kênh:*\n\
    - Đăng ký kênh để nhận thông báo khi có video mới\n\
    - Tự động tóm tắt nội dung video mới\n\n\
    *Lưu ý:*\n\
    - Video YouTube phải có phụ đề tiếng Việt\n\
    - Thời gian xử lý phụ thuộc vào độ dài nội dung\n\n\
    *Các lệnh có sẵn:*\n\
    /start - Khởi động bot\n\
    /help - Xem hướng dẫn sử dụng\n\
    /language [vi/en] - Thay đổi ngôn ngữ phụ đề (mặc định: Tiếng Việt)\n\
    /subscribe [URL] - Đăng ký theo dõi kênh YouTube, TikTok hoặc Facebook\n\
    /unsubscribe [URL] - Hủy đăng ký theo dõi kênh\n\
    /list - Xem danh sách kênh đã đăng ký";

pub const LANGUAGE_USAGE: &str = "Vui lòng cung cấp mã ngôn ngữ. Ví dụ: /language en";

pub const LANGUAGE_UNSUPPORTED: &str =
    "Ngôn ngữ không được hỗ trợ. Hiện tại bot chỉ hỗ trợ: vi (Tiếng Việt) và en (Tiếng Anh).";

pub const SUBSCRIBE_USAGE: &str = "Vui lòng cung cấp URL kênh YouTube, TikTok hoặc Facebook. \
    Ví dụ: /subscribe https://www.youtube.com/channel/UC...";

pub const UNSUBSCRIBE_USAGE: &str = "Vui lòng cung cấp URL kênh YouTube, TikTok hoặc Facebook \
    đã đăng ký. Ví dụ: /unsubscribe https://www.youtube.com/channel/UC...";

pub const PROCESSING_SUBSCRIBE: &str =
    "⏳ Đang xử lý yêu cầu đăng ký kênh...\nVui lòng đợi trong giây lát...";

pub const PROCESSING_UNSUBSCRIBE: &str =
    "⏳ Đang xử lý yêu cầu hủy đăng ký...\nVui lòng đợi trong giây lát...";

pub const SUMMARIZING: &str = "✅ Đã trích xuất nội dung thành công!\n\
    🧠 Đang tóm tắt nội dung...\n\
    ⏳ Vui lòng đợi trong giây lát...";

pub const SUMMARY_FAILED: &str = "❌ Lỗi khi tóm tắt nội dung. Vui lòng thử lại sau.";

pub const NO_SUBSCRIPTIONS: &str = "📋 Bạn chưa đăng ký theo dõi kênh nào.";

pub const INTERNAL_ERROR: &str = "❌ Đã xảy ra lỗi. Vui lòng thử lại sau.";

fn platform_label(platform: Platform) -> &'static str {
    match platform {
        Platform::Youtube => "YouTube",
        Platform::Tiktok => "TikTok",
        Platform::Facebook => "Facebook",
    }
}

pub fn welcome(first_name: &str) -> String {
    format!(
        "Xin chào, {first_name}! 👋\n\n\
         Tôi là bot tóm tắt video. Để sử dụng, chỉ cần gửi cho tôi đường link video \
         hoặc kênh YouTube, TikTok hoặc Facebook.\n\n\
         📍 Sử dụng /help để xem hướng dẫn chi tiết."
    )
}

pub fn language_changed(code: &str) -> String {
    let name = if code == "vi" { "Tiếng Việt" } else { "English" };
    format!("Đã chuyển ngôn ngữ phụ đề sang {name}.")
}

pub fn language_error(err: &LanguageError) -> &'static str {
    match err {
        LanguageError::Unsupported(_) => LANGUAGE_UNSUPPORTED,
        LanguageError::Store(_) => INTERNAL_ERROR,
    }
}

pub fn subscribed(channel: &Channel) -> String {
    format!("✅ Đã đăng ký theo dõi kênh: {}", channel.display_name())
}

pub fn subscribe_error(err: &SubscribeError) -> String {
    match err {
        SubscribeError::UnsupportedUrl => {
            "❌ URL không hợp lệ. Vui lòng nhập URL kênh YouTube, TikTok hoặc Facebook.".into()
        }
        SubscribeError::Resolve { platform, .. } => format!(
            "❌ Không thể lấy thông tin kênh {}.",
            platform_label(*platform)
        ),
        SubscribeError::AlreadySubscribed { channel } => {
            format!("❌ Bạn đã đăng ký kênh {} rồi.", channel.display_name())
        }
        SubscribeError::Store(_) => "❌ Đã xảy ra lỗi khi đăng ký kênh.".into(),
    }
}

pub fn unsubscribed(channel: &Channel) -> String {
    format!("✅ Đã hủy đăng ký kênh: {}", channel.display_name())
}

pub fn unsubscribe_error(err: &UnsubscribeError) -> String {
    match err {
        UnsubscribeError::UnsupportedUrl => {
            "❌ URL không hợp lệ. Vui lòng nhập URL kênh YouTube, TikTok hoặc Facebook.".into()
        }
        UnsubscribeError::Resolve { platform, .. } => format!(
            "❌ Không thể xác định ID kênh {} từ URL đã cung cấp.",
            platform_label(*platform)
        ),
        UnsubscribeError::UnknownChannel | UnsubscribeError::NotSubscribed => {
            "❌ Bạn chưa đăng ký kênh này.".into()
        }
        UnsubscribeError::Store(_) => "❌ Đã xảy ra lỗi khi hủy đăng ký kênh.".into(),
    }
}

pub fn subscription_list(channels: &[Channel]) -> String {
    let mut message = String::from("📋 *DANH SÁCH KÊNH ĐÃ ĐĂNG KÝ*\n\n");
    for (i, channel) in channels.iter().enumerate() {
        message.push_str(&format!(
            "{}. {} *{}*\n   🔗 {}\n\n",
            i + 1,
            channel.platform.icon(),
            channel.display_name(),
            channel.channel_url
        ));
    }
    message.push_str("Để hủy đăng ký, sử dụng lệnh: /unsubscribe [URL kênh]");
    message
}

pub fn processing_video(platform: Platform) -> String {
    format!(
        "⏳ Đang xử lý video {}...\n🔍 Đang trích xuất nội dung...",
        platform_label(platform)
    )
}

pub fn extract_failed(platform: Platform) -> String {
    format!(
        "❌ Không thể trích xuất nội dung video {}.\n\n\
         Thử gửi một video khác hoặc sử dụng lệnh /language để chuyển ngôn ngữ phụ đề.",
        platform_label(platform)
    )
}

pub fn video_summary(platform: Platform, url: &str, summary: &str) -> String {
    format!(
        "📝 *TÓM TẮT VIDEO {}*\n\n🔗 *Link:* {}\n\n{}",
        platform_label(platform).to_uppercase(),
        url,
        summary
    )
}

/// The poller's fan-out message. The summary block is present only when
/// summarization succeeded; the notification goes out either way.
pub fn new_video_notification(channel: &Channel, video: &Video) -> String {
    let mut message = format!(
        "🎥 Video mới từ {}!\n\n📝 {}\n🔗 {}\n",
        channel.display_name(),
        video.title,
        video.url
    );
    if let Some(summary) = &video.summary {
        message.push_str(&format!("\n📋 Tóm tắt:\n{summary}"));
    }
    message
}
