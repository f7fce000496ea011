// 标准库导入
use std::time::Duration;

// 本地模块导入
use crate::page::PageTranslationReport;

/// 一次 `page` 运行的耗时与大小统计
#[derive(Debug, Default)]
pub struct PageRunStats {
    pub load_time: Duration,
    pub translation_time: Duration,
    pub write_time: Duration,
    pub input_size: usize,
    pub output_size: usize,
}

/// 打印整页翻译统计
pub fn print_page_report(
    report: &PageTranslationReport,
    stats: &PageRunStats,
    total_duration: Duration,
) {
    println!("\n📊 Page translation report:");
    println!("═══════════════════════════════════════");

    println!("⏱️  Timings:");
    println!("   Load: {}", format_duration(stats.load_time));
    println!("   Translation: {}", format_duration(stats.translation_time));
    println!("   Write: {}", format_duration(stats.write_time));
    println!("   Total: {}", format_duration(total_duration));

    println!("\n📏 Sizes:");
    println!(
        "   Input: {} bytes ({:.1} KB)",
        stats.input_size,
        stats.input_size as f64 / 1024.0
    );
    println!(
        "   Output: {} bytes ({:.1} KB)",
        stats.output_size,
        stats.output_size as f64 / 1024.0
    );

    println!("\n🔤 Translation ({}):", report.mode);
    println!("   Candidates: {}", report.candidates);
    println!("   Requests: {}", report.requests);
    println!("   Translated: {}", report.translated);
    println!("   Failed requests: {}", report.failed_units);
    println!("   Left untouched: {}", report.untouched);
    println!("   Coverage: {}", format_coverage(report));
}

/// 已翻译候选项占比
pub fn format_coverage(report: &PageTranslationReport) -> String {
    if report.candidates == 0 {
        return "n/a".to_string();
    }
    format!(
        "{:.1}%",
        report.translated as f64 / report.candidates as f64 * 100.0
    )
}

/// 格式化持续时间
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.3}s", duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PageMode;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.500s");
    }

    #[test]
    fn test_format_coverage() {
        let mut report = PageTranslationReport {
            mode: PageMode::AllText,
            candidates: 4,
            translated: 3,
            ..Default::default()
        };
        assert_eq!(format_coverage(&report), "75.0%");

        report.candidates = 0;
        assert_eq!(format_coverage(&report), "n/a");
    }
}
