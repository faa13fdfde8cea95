use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Username template with a single contiguous run of `#` placeholders
/// marking the zero-padded digit field, e.g. `TST#######`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityTemplate {
    prefix: String,
    width: usize,
    suffix: String,
}

impl IdentityTemplate {
    pub fn parse(raw: &str) -> Result<Self> {
        let Some(start) = raw.find('#') else {
            bail!("user template `{raw}` must contain a `#` placeholder run");
        };
        let end = start + raw[start..].bytes().take_while(|b| *b == b'#').count();
        if raw[end..].contains('#') {
            bail!("user template `{raw}` must contain exactly one `#` placeholder run");
        }

        Ok(Self {
            prefix: raw[..start].to_string(),
            width: end - start,
            suffix: raw[end..].to_string(),
        })
    }

    /// Numbers wider than the placeholder run are rendered in full, never
    /// truncated.
    pub fn render(&self, number: u64) -> String {
        format!(
            "{}{:0width$}{}",
            self.prefix,
            number,
            self.suffix,
            width = self.width
        )
    }
}

#[derive(Debug, Clone)]
pub struct IdentityGenerator {
    start: u64,
    end: u64,
    template: IdentityTemplate,
}

impl IdentityGenerator {
    pub fn new(start: u64, end: u64, template: IdentityTemplate) -> Self {
        debug_assert!(start <= end);
        Self {
            start,
            end,
            template,
        }
    }

    pub fn period(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn user_number(&self, index: usize) -> u64 {
        self.start + index as u64 % self.period()
    }

    pub fn username(&self, index: usize) -> String {
        self.template.render(self.user_number(index))
    }
}

#[cfg(test)]
mod tests {
    use super::{IdentityGenerator, IdentityTemplate};

    #[test]
    fn parses_prefix_run_and_suffix() {
        let template = IdentityTemplate::parse("TST###@lab").expect("template should parse");
        assert_eq!(template.render(7), "TST007@lab");
    }

    #[test]
    fn rejects_template_without_placeholder() {
        assert!(IdentityTemplate::parse("TST").is_err());
    }

    #[test]
    fn rejects_template_with_split_runs() {
        assert!(IdentityTemplate::parse("TST##-##").is_err());
    }

    #[test]
    fn render_does_not_truncate_wide_numbers() {
        let template = IdentityTemplate::parse("U##").expect("template should parse");
        assert_eq!(template.render(12345), "U12345");
    }

    #[test]
    fn first_index_maps_to_range_start() {
        let template = IdentityTemplate::parse("TST#######").expect("template should parse");
        let generator = IdentityGenerator::new(1, 10_000, template);

        assert_eq!(generator.username(0), "TST0000001");
        assert_eq!(generator.username(41), "TST0000042");
    }

    #[test]
    fn deterministic_for_same_index() {
        let template = IdentityTemplate::parse("TST#####").expect("template should parse");
        let gen_a = IdentityGenerator::new(1, 500, template.clone());
        let gen_b = IdentityGenerator::new(1, 500, template);

        assert_eq!(gen_a.username(123), gen_b.username(123));
    }

    #[test]
    fn periodic_with_range_period() {
        let template = IdentityTemplate::parse("TST####").expect("template should parse");
        let generator = IdentityGenerator::new(10, 19, template);

        assert_eq!(generator.period(), 10);
        for index in 0..30 {
            assert_eq!(
                generator.username(index),
                generator.username(index + generator.period() as usize)
            );
        }
    }
}
