mod format_rss;
mod parse_duration;

pub(crate) use format_rss::format_rss;
pub(crate) use parse_duration::parse_duration;
