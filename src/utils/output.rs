use std::fmt::Display;

/// Output format configuration
#[derive(Clone, Debug)]
pub struct OutputFormat {
    pub raw: bool,
}

impl OutputFormat {
    pub fn new(raw: bool) -> Self {
        Self { raw }
    }

    /// Print tabular data - either raw (tab-separated) or column-aligned
    pub fn print_table<T>(&self, data: &[Vec<T>])
    where
        T: Display + AsRef<str>,
    {
        for line in self.render_table(data) {
            println!("{line}");
        }
    }

    /// Print key-value pairs
    pub fn print_key_value<K, V>(&self, pairs: &[(K, V)])
    where
        K: Display + AsRef<str>,
        V: Display + AsRef<str>,
    {
        let data: Vec<Vec<String>> = pairs
            .iter()
            .map(|(k, v)| vec![k.to_string(), v.to_string()])
            .collect();

        self.print_table(&data);
    }

    fn render_table<T>(&self, data: &[Vec<T>]) -> Vec<String>
    where
        T: Display + AsRef<str>,
    {
        if self.raw {
            return data
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|cell| cell.as_ref())
                        .collect::<Vec<_>>()
                        .join("\t")
                })
                .collect();
        }

        let num_cols = data.iter().map(Vec::len).max().unwrap_or(0);
        let mut col_widths = vec![0; num_cols];
        for row in data {
            for (i, cell) in row.iter().enumerate() {
                col_widths[i] = col_widths[i].max(cell.as_ref().len());
            }
        }

        data.iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(i, cell)| {
                        if i == row.len() - 1 {
                            // Last column - no padding needed
                            cell.to_string()
                        } else {
                            format!("{:<width$}", cell.as_ref(), width = col_widths[i])
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("  ")
            })
            .collect()
    }
}
