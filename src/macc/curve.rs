use rand::Rng;
use crate::errors::{ChartError, ChartResult};

/// A validated chart submission: parallel lists of equal, non-zero length.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRequest {
    pub organisation: String,
    pub categories: Vec<String>,
    pub costs: Vec<f64>,
    pub widths: Vec<f64>,
    pub reference_line: Option<f64>,
}

/// One positioned bar of the curve.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub category: String,
    /// Left edge: the sum of all preceding widths.
    pub x: f64,
    pub width: f64,
    pub cost: f64,
    pub color: [u8; 3],
}

impl Bar {
    pub fn center(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

/// Bar geometry for a Marginal Abatement Cost Curve.
#[derive(Debug, Clone, PartialEq)]
pub struct MaccCurve {
    pub organisation: String,
    pub bars: Vec<Bar>,
    pub total_abatement: f64,
    pub reference_line: Option<f64>,
}

/// Splits a comma-separated field into trimmed tokens. A blank field has no tokens.
fn split_list(raw: &str) -> Vec<&str> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(',').map(str::trim).collect()
}

fn parse_number(field: &'static str, token: &str) -> ChartResult<f64> {
    token
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ChartError::Parse {
            field,
            token: token.to_string(),
        })
}

impl ChartRequest {
    /// Parses the raw form fields of a chart submission.
    ///
    /// # Arguments
    ///
    /// * `organisation` - Name printed in the chart title.
    /// * `categories` - Comma-separated category labels.
    /// * `costs` - Comma-separated cost per unit for each category.
    /// * `widths` - Comma-separated abatement quantity for each category.
    /// * `reference_line` - Optional height of a horizontal reference line; blank means none.
    ///
    /// # Returns
    ///
    /// The parsed request, or `EmptyInput` when every list is blank, `LengthMismatch` when the
    /// lists differ in length, `Parse` naming the first bad number, `InvalidWidth` for a negative width.
    pub fn parse(
        organisation: &str,
        categories: &str,
        costs: &str,
        widths: &str,
        reference_line: Option<&str>,
    ) -> ChartResult<Self> {
        let categories = split_list(categories);
        let cost_tokens = split_list(costs);
        let width_tokens = split_list(widths);

        if categories.is_empty() && cost_tokens.is_empty() && width_tokens.is_empty() {
            return Err(ChartError::EmptyInput);
        }
        if categories.len() != cost_tokens.len() || categories.len() != width_tokens.len() {
            return Err(ChartError::LengthMismatch {
                categories: categories.len(),
                values: cost_tokens.len(),
                widths: width_tokens.len(),
            });
        }

        let costs = cost_tokens
            .iter()
            .map(|token| parse_number("values", token))
            .collect::<ChartResult<Vec<_>>>()?;
        let widths = width_tokens
            .iter()
            .map(|token| parse_number("widths", token))
            .collect::<ChartResult<Vec<_>>>()?;

        if let Some((index, &width)) = widths.iter().enumerate().find(|(_, w)| **w < 0.0) {
            return Err(ChartError::InvalidWidth { index, width });
        }

        let reference_line = reference_line
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(|raw| parse_number("line_value", raw))
            .transpose()?;

        Ok(Self {
            organisation: organisation.trim().to_string(),
            categories: categories.into_iter().map(String::from).collect(),
            costs,
            widths,
            reference_line,
        })
    }
}

impl MaccCurve {
    /// Lays the bars out left to right with no gaps and assigns each a random colour.
    ///
    /// Bar `i` starts at the sum of `widths[0..i]`, spans its width and rises to its cost.
    pub fn build<R: Rng + ?Sized>(request: &ChartRequest, rng: &mut R) -> Self {
        let mut x = 0.0;
        let bars = request
            .categories
            .iter()
            .zip(&request.costs)
            .zip(&request.widths)
            .map(|((category, &cost), &width)| {
                let bar = Bar {
                    category: category.clone(),
                    x,
                    width,
                    cost,
                    color: rng.gen(),
                };
                x += width;
                bar
            })
            .collect::<Vec<_>>();

        Self {
            organisation: request.organisation.clone(),
            total_abatement: x,
            bars,
            reference_line: request.reference_line,
        }
    }

    pub fn title(&self) -> String {
        format!("Marginal Abatement Cost Curve (MACC) - {}", self.organisation)
    }

    /// Vertical extent covering every bar, the zero baseline and the reference line.
    pub fn cost_range(&self) -> (f64, f64) {
        let mut low = 0.0f64;
        let mut high = 0.0f64;
        for value in self.bars.iter().map(|b| b.cost).chain(self.reference_line) {
            low = low.min(value);
            high = high.max(value);
        }
        (low, high)
    }
}
