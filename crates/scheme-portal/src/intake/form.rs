use std::collections::BTreeMap;
use std::str::FromStr;

/// Text parts of a multipart request. Repeated names accumulate in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    values: BTreeMap<String, Vec<String>>,
}

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.entry(name.into()).or_default().push(value.into());
    }

    /// First value for `name`, trimmed; blank values count as absent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .and_then(|values| values.first())
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// First value for `name` exactly as submitted, without trimming.
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn all(&self, name: &str) -> &[String] {
        self.values.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn reader(&self) -> FieldReader<'_> {
        FieldReader {
            fields: self,
            problems: Vec::new(),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for FormFields
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = FormFields::new();
        for (name, value) in iter {
            fields.push(name, value);
        }
        fields
    }
}

/// Typed extraction over [`FormFields`] that records every problem instead of stopping at the
/// first one.
#[derive(Debug)]
pub struct FieldReader<'a> {
    fields: &'a FormFields,
    problems: Vec<String>,
}

impl<'a> FieldReader<'a> {
    pub fn required_text(&mut self, name: &str) -> String {
        match self.fields.text(name) {
            Some(value) => value.to_string(),
            None => {
                self.problems.push(format!("{name} is required"));
                String::new()
            }
        }
    }

    /// Untrimmed value for secrets; only an empty or all-whitespace value counts as missing.
    pub fn required_raw(&mut self, name: &str) -> String {
        match self.fields.raw(name) {
            Some(value) if !value.trim().is_empty() => value.to_string(),
            _ => {
                self.problems.push(format!("{name} is required"));
                String::new()
            }
        }
    }

    pub fn optional_text(&self, name: &str) -> Option<String> {
        self.fields.text(name).map(str::to_string)
    }

    pub fn required_number<T>(&mut self, name: &str) -> T
    where
        T: FromStr + Default,
    {
        match self.fields.text(name) {
            Some(raw) => match raw.parse::<T>() {
                Ok(value) => value,
                Err(_) => {
                    self.problems
                        .push(format!("{name} must be a non-negative number"));
                    T::default()
                }
            },
            None => {
                self.problems.push(format!("{name} is required"));
                T::default()
            }
        }
    }

    /// Every value for `name`; a single comma-separated value is split into items.
    pub fn list(&self, name: &str) -> Vec<String> {
        let values = self.fields.all(name);
        let items: Vec<String> = if values.len() == 1 {
            values[0].split(',').map(str::to_string).collect()
        } else {
            values.to_vec()
        };
        items
            .into_iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    }

    pub fn finish(self) -> Result<(), Vec<String>> {
        if self.problems.is_empty() {
            Ok(())
        } else {
            Err(self.problems)
        }
    }
}
