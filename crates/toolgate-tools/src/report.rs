//! Sales report download tool
//!
//! Produces a small CSV sales report for a given day. The figures are fixed
//! sample data; only the date varies.

use async_trait::async_trait;
use chrono::NaiveDate;
use toolgate_core::{
    ContentItem, FieldSchema, InputSchema, SchemaError, Tool, ToolDescriptor, ToolFailure,
    ToolResult, ValidatedArguments,
};
use tracing::debug;

pub const DOWNLOAD_REPORT: &str = "downloadReport";

const DATE_FORMAT: &str = "%Y-%m-%d";
const CSV_MIME_TYPE: &str = "text/csv";

/// Product name and sales amount in cents.
const LINE_ITEMS: &[(&str, u64)] = &[("产品A", 100_000), ("产品B", 200_000), ("产品C", 150_000)];

fn format_amount(cents: u64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

/// Render the CSV body for `date`.
pub fn render_report(date: &str) -> String {
    let mut lines = vec![
        format!("日期: {date}"),
        String::new(),
        "销售报表".to_string(),
        String::new(),
        "产品名称,销售额".to_string(),
    ];
    lines.extend(
        LINE_ITEMS
            .iter()
            .map(|(product, cents)| format!("{product},{}", format_amount(*cents))),
    );
    let total: u64 = LINE_ITEMS.iter().map(|(_, cents)| cents).sum();
    lines.push(String::new());
    lines.push(format!("总计,{}", format_amount(total)));
    lines.join("\n")
}

pub fn report_file_name(date: &str) -> String {
    format!("report-{date}.csv")
}

/// `downloadReport`: returns the report as a CSV file followed by a
/// confirmation message.
#[derive(Debug, Clone)]
pub struct DownloadReportTool {
    schema: InputSchema,
}

impl DownloadReportTool {
    pub fn new() -> Result<Self, SchemaError> {
        let schema = InputSchema::builder()
            .required_property(
                "date",
                FieldSchema::string()
                    .with_description("报表日期，格式为YYYY-MM-DD")
                    .with_pattern(r"^\d{4}-\d{2}-\d{2}$"),
            )
            .build()?;
        Ok(Self { schema })
    }
}

#[async_trait]
impl Tool for DownloadReportTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(DOWNLOAD_REPORT, "下载指定日期的销售报表", self.schema.clone())
    }

    async fn execute(&self, arguments: ValidatedArguments) -> Result<ToolResult, ToolFailure> {
        let date = arguments
            .get_str("date")
            .ok_or_else(|| ToolFailure::invalid_argument("date", "缺少日期参数"))?;

        // The pattern admits impossible dates like 2025-13-45.
        NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|_| {
            ToolFailure::invalid_argument("date", "日期格式无效，请使用YYYY-MM-DD格式")
        })?;

        let file_name = report_file_name(date);
        let body = render_report(date);
        debug!(date, file = %file_name, bytes = body.len(), "Generated sales report");

        let summary = format!(
            "已生成{date}的销售报表\n\n文件名: {file_name}\n文件类型: {CSV_MIME_TYPE}"
        );

        Ok(
            ToolResult::new(ContentItem::file(file_name, CSV_MIME_TYPE, body.into_bytes()))
                .with(ContentItem::text(summary)),
        )
    }
}
