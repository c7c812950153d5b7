//! 结果报告：控制台摘要、运行进度与 HTML 报告

mod console;
mod html;

pub use console::{ConsoleProgress, ConsoleReporter, final_line};
pub use html::HtmlReporter;
