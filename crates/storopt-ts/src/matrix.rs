use std::{collections::BTreeMap, io::Write};

/// Per-step, per-entity real-power injections in MW.
///
/// Rows follow ascending time-step index; columns are load points followed by
/// generation points. Loads are positive (draw), generation is negative.
#[derive(Debug, Clone, PartialEq)]
pub struct InjectionMatrix {
    steps: Vec<i64>,
    columns: Vec<String>,
    n_loads: usize,
    values: Vec<f64>,
}

impl InjectionMatrix {
    /// Zero-filled matrix with one row per step.
    pub(crate) fn zeros(steps: Vec<i64>, columns: Vec<String>, n_loads: usize) -> Self {
        let values = vec![0.0; steps.len() * columns.len()];
        Self {
            steps,
            columns,
            n_loads,
            values,
        }
    }

    pub(crate) fn row_mut(&mut self, t: usize) -> &mut [f64] {
        let width = self.columns.len();
        &mut self.values[t * width..(t + 1) * width]
    }

    pub fn n_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn n_loads(&self) -> usize {
        self.n_loads
    }

    pub fn n_generators(&self) -> usize {
        self.columns.len() - self.n_loads
    }

    /// Time-step index of every row
    pub fn steps(&self) -> &[i64] {
        &self.steps
    }

    /// Entity names in column order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row(&self, t: usize) -> &[f64] {
        let width = self.columns.len();
        &self.values[t * width..(t + 1) * width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        // chunks_exact panics on zero width; a matrix always has a load column
        self.values.chunks_exact(self.columns.len().max(1))
    }

    pub fn value(&self, t: usize, column: usize) -> f64 {
        self.row(t)[column]
    }

    pub fn load_columns(&self, t: usize) -> &[f64] {
        &self.row(t)[..self.n_loads]
    }

    pub fn generation_columns(&self, t: usize) -> &[f64] {
        &self.row(t)[self.n_loads..]
    }

    /// Map each time-step index to its flattened row.
    pub fn to_step_map(&self) -> BTreeMap<i64, Vec<f64>> {
        self.steps
            .iter()
            .copied()
            .zip(self.rows().map(|row| row.to_vec()))
            .collect()
    }

    /// Serialize the step map; integer keys become JSON strings.
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.to_step_map())
    }

    pub fn write_json<W: Write>(&self, writer: W) -> serde_json::Result<()> {
        serde_json::to_writer_pretty(writer, &self.to_step_map())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InjectionMatrix {
        let mut matrix = InjectionMatrix::zeros(
            vec![0, 5],
            vec!["l0".into(), "g0".into(), "g1".into()],
            1,
        );
        matrix.row_mut(0).copy_from_slice(&[1.0, -0.5, -0.25]);
        matrix.row_mut(1).copy_from_slice(&[2.0, -1.0, -0.75]);
        matrix
    }

    #[test]
    fn accessors_split_loads_and_generation() {
        let matrix = sample();
        assert_eq!(matrix.n_steps(), 2);
        assert_eq!(matrix.n_generators(), 2);
        assert_eq!(matrix.load_columns(1), &[2.0]);
        assert_eq!(matrix.generation_columns(0), &[-0.5, -0.25]);
        assert_eq!(matrix.value(1, 2), -0.75);
        assert_eq!(matrix.rows().count(), 2);
    }

    #[test]
    fn json_uses_string_step_keys() {
        let json = sample().to_json_string().unwrap();
        assert_eq!(json, r#"{"0":[1.0,-0.5,-0.25],"5":[2.0,-1.0,-0.75]}"#);
    }

    #[test]
    fn step_map_orders_numerically() {
        let mut matrix = InjectionMatrix::zeros(vec![2, 10], vec!["l0".into()], 1);
        matrix.row_mut(1)[0] = 3.0;
        let keys: Vec<_> = matrix.to_step_map().into_keys().collect();
        assert_eq!(keys, vec![2, 10]);
        let json = matrix.to_json_string().unwrap();
        assert!(json.starts_with(r#"{"2":"#));
    }
}
