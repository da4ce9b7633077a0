use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("No chart data was provided")]
    EmptyInput,

    #[error("Mismatched lengths of inputs: categories={categories}, values={values}, widths={widths}")]
    LengthMismatch {
        categories: usize,
        values: usize,
        widths: usize,
    },

    #[error("Could not read {field} entry {token:?} as a number")]
    Parse { field: &'static str, token: String },

    #[error("Width {width} of bar {index} must not be negative")]
    InvalidWidth { index: usize, width: f64 },

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("Chart rendering timed out after {0} seconds")]
    Timeout(u64),

    #[error("Chart rendering panicked: {0}")]
    TaskPanic(String),
}

impl ChartError {
    /// Input errors are reported inline on the form; everything else is a rendering failure.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ChartError::EmptyInput
                | ChartError::LengthMismatch { .. }
                | ChartError::Parse { .. }
                | ChartError::InvalidWidth { .. }
        )
    }
}

pub type ChartResult<T> = Result<T, ChartError>;
