// ==========================================
// 组织动员平台 - 名册导入 - 文件解析器实现
// ==========================================
// 职责: 阶段 0,上传文件 → 按列序排列的原始行
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// ==========================================

use crate::domain::import::UploadedRow;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::roster_import_trait::FileParser;
use calamine::{open_workbook, Reader, Xlsx};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_rows(&self, file_path: &Path) -> ImportResult<Vec<UploadedRow>> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        // 检查扩展名
        if let Some(ext) = file_path.extension() {
            if ext.to_string_lossy().to_lowercase() != "csv" {
                return Err(ImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        // 表头行是否存在由上层的表头设置决定,此处一律按数据行读取
        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let mut rows = Vec::new();
        let mut row_number = 0;
        for result in reader.records() {
            let record = result?;
            let cells: Vec<String> = record.iter().map(|cell| cell.to_string()).collect();

            // 跳过完全空白的行
            if cells.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }

            row_number += 1;
            rows.push(UploadedRow { row_number, cells });
        }

        Ok(rows)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_rows(&self, file_path: &Path) -> ImportResult<Vec<UploadedRow>> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook: Xlsx<_> = open_workbook(file_path)
            .map_err(|e: calamine::XlsxError| ImportError::ExcelParseError(e.to_string()))?;

        // 读取第一个 sheet
        let sheet_names = workbook.sheet_names();
        if sheet_names.is_empty() {
            return Err(ImportError::ExcelParseError(
                "Excel 文件无工作表".to_string(),
            ));
        }

        let sheet_name = sheet_names[0].clone();
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        let mut rows = Vec::new();
        let mut row_number = 0;
        for data_row in range.rows() {
            let cells: Vec<String> = data_row.iter().map(|cell| cell.to_string()).collect();

            // 跳过完全空白的行
            if cells.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }

            row_number += 1;
            rows.push(UploadedRow { row_number, cells });
        }

        Ok(rows)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse_rows(&self, file_path: &Path) -> ImportResult<Vec<UploadedRow>> {
        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvParser.parse_rows(file_path),
            "xlsx" | "xls" => ExcelParser.parse_rows(file_path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}
