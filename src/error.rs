use thiserror::Error;

/// 应用统一错误类型
///
/// 聚合管线本身是全函数，不会因数据形态异常报错；这里只覆盖外围环节
/// （配置、数据集导入、参数解析）。
#[derive(Error, Debug)]
pub enum AppError {
    /// 配置加载或解析错误
    #[error("配置错误: {0}")]
    Config(String),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(String),

    /// 数据集导入错误（CSV/JSON 结构问题）
    #[error("导入错误: {0}")]
    Import(String),

    /// JSON 解析错误
    #[error("JSON 解析错误: {0}")]
    Json(String),

    /// 参数校验错误（如未知的分桶模式、性别取值）
    #[error("参数校验错误: {0}")]
    Validation(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),
}

impl AppError {
    /// 稳定的错误码，便于调用方程序化处理
    pub fn stable_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_INVALID",
            AppError::Io(_) => "IO_ERROR",
            AppError::Import(_) => "IMPORT_FAILED",
            AppError::Json(_) => "BAD_JSON",
            AppError::Validation(_) => "VALIDATION_FAILED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

// =============== Error conversions for common external errors ===============

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        match err.kind() {
            csv::ErrorKind::Io(e) => AppError::Io(e.to_string()),
            _ => AppError::Import(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Json(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::AppError;

    #[test]
    fn io_error_converts_to_io_variant() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "orders.csv");
        let err: AppError = io.into();
        assert!(matches!(err, AppError::Io(_)), "got: {err:?}");
        assert_eq!(err.stable_code(), "IO_ERROR");
    }

    #[test]
    fn json_error_converts_to_json_variant() {
        let je = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: AppError = je.into();
        assert!(matches!(err, AppError::Json(_)), "got: {err:?}");
        assert!(err.to_string().starts_with("JSON 解析错误"));
    }

    #[test]
    fn csv_structure_error_is_import_error() {
        let data = "sku,status\nA,Delivered,extra\n";
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(data.as_bytes());
        let err = rdr
            .records()
            .next()
            .expect("one record")
            .expect_err("unequal lengths");
        let app: AppError = err.into();
        assert!(matches!(app, AppError::Import(_)), "got: {app:?}");
    }
}
