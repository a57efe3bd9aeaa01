//! Graph data
//!
//! The node/edge/feature container handed to detectors, and the column major
//! `Matrix` view used to read node features without copying.
use crate::errors::DetectorError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Contiguous column major view over node features.
///
/// Rows are nodes, columns are features. The view borrows the buffer owned
/// by a [`Graph`].
pub struct Matrix<'a, T> {
    /// The raw data stored in a single slice.
    pub data: &'a [T],
    /// Number of rows (nodes) in the matrix.
    pub rows: usize,
    /// Number of columns (features) in the matrix.
    pub cols: usize,
}

impl<'a, T> Matrix<'a, T> {
    /// Create a new Matrix.
    pub fn new(data: &'a [T], rows: usize, cols: usize) -> Self {
        Matrix { data, rows, cols }
    }

    /// Get a single reference to an item in the matrix.
    ///
    /// * `i` - The ith row of the data to get.
    /// * `j` - the jth column of the data to get.
    pub fn get(&self, i: usize, j: usize) -> &T {
        &self.data[i + j * self.rows]
    }

    /// Get access to a row of the data, as an iterator.
    pub fn get_row_iter(&self, row: usize) -> std::iter::StepBy<std::iter::Skip<std::slice::Iter<'a, T>>> {
        self.data.iter().skip(row).step_by(self.rows)
    }

    /// Get an entire column in the matrix.
    ///
    /// * `col` - The index of the column to get.
    pub fn get_col(&self, col: usize) -> &[T] {
        &self.data[col * self.rows..(col + 1) * self.rows]
    }
}

impl<'a, T> Matrix<'a, T>
where
    T: Copy,
{
    /// Get a row of the data as a vector.
    pub fn get_row(&self, row: usize) -> Vec<T> {
        self.get_row_iter(row).copied().collect()
    }
}

impl<'a, T> fmt::Display for Matrix<'a, T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut val = String::new();
        for i in 0..self.rows {
            for j in 0..self.cols {
                val.push_str(self.get(i, j).to_string().as_str());
                if j == (self.cols - 1) {
                    val.push('\n');
                } else {
                    val.push(' ');
                }
            }
        }
        write!(f, "{}", val)
    }
}

/// Attributed graph: node features, directed edge list and optional
/// ground truth labels (1 = outlier).
///
/// Detectors only read from a graph. Node order is the order of rows in `x`
/// and is the order of every score vector produced for this graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GraphData")]
pub struct Graph {
    /// Node features, column major, `n_nodes * n_features` values.
    x: Vec<f64>,
    n_nodes: usize,
    n_features: usize,
    /// `[source, target]` node index pairs.
    edge_index: Vec<[usize; 2]>,
    /// Optional per-node ground truth.
    y: Option<Vec<f64>>,
}

/// Unvalidated form of a [`Graph`] as read from JSON.
#[derive(Deserialize)]
struct GraphData {
    x: Vec<f64>,
    n_nodes: usize,
    n_features: usize,
    edge_index: Vec<[usize; 2]>,
    y: Option<Vec<f64>>,
}

impl TryFrom<GraphData> for Graph {
    type Error = DetectorError;

    fn try_from(data: GraphData) -> Result<Self, Self::Error> {
        let graph = Graph::new(data.x, data.n_nodes, data.n_features, data.edge_index)?;
        match data.y {
            Some(y) => graph.with_labels(y),
            None => Ok(graph),
        }
    }
}

impl Graph {
    /// Build a graph, validating the feature buffer and the edge endpoints.
    ///
    /// * `x` - Column major node features.
    /// * `n_nodes` - Number of nodes.
    /// * `n_features` - Number of features per node.
    /// * `edge_index` - Directed edges as `[source, target]`.
    pub fn new(
        x: Vec<f64>,
        n_nodes: usize,
        n_features: usize,
        edge_index: Vec<[usize; 2]>,
    ) -> Result<Self, DetectorError> {
        if x.len() != n_nodes * n_features {
            return Err(DetectorError::MalformedGraph(format!(
                "feature buffer holds {} values, expected {} nodes x {} features",
                x.len(),
                n_nodes,
                n_features
            )));
        }
        if let Some([s, t]) = edge_index.iter().find(|[s, t]| *s >= n_nodes || *t >= n_nodes) {
            return Err(DetectorError::MalformedGraph(format!(
                "edge ({}, {}) references a node outside 0..{}",
                s, t, n_nodes
            )));
        }
        Ok(Graph {
            x,
            n_nodes,
            n_features,
            edge_index,
            y: None,
        })
    }

    /// Attach ground truth labels, one per node.
    pub fn with_labels(mut self, y: Vec<f64>) -> Result<Self, DetectorError> {
        if y.len() != self.n_nodes {
            return Err(DetectorError::MalformedGraph(format!(
                "{} labels provided for {} nodes",
                y.len(),
                self.n_nodes
            )));
        }
        self.y = Some(y);
        Ok(self)
    }

    pub fn n_nodes(&self) -> usize {
        self.n_nodes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_edges(&self) -> usize {
        self.edge_index.len()
    }

    /// Node features as a column major matrix view.
    pub fn features(&self) -> Matrix<'_, f64> {
        Matrix::new(&self.x, self.n_nodes, self.n_features)
    }

    pub fn edge_index(&self) -> &[[usize; 2]] {
        &self.edge_index
    }

    pub fn labels(&self) -> Option<&[f64]> {
        self.y.as_deref()
    }

    /// Out-degree plus in-degree of every node.
    pub fn degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0; self.n_nodes];
        for [s, t] in &self.edge_index {
            degrees[*s] += 1;
            degrees[*t] += 1;
        }
        degrees
    }

    /// Undirected adjacency lists, neighbours in edge order.
    pub fn adjacency(&self) -> Vec<Vec<usize>> {
        let mut adj = vec![Vec::new(); self.n_nodes];
        for [s, t] in &self.edge_index {
            adj[*s].push(*t);
            if s != t {
                adj[*t].push(*s);
            }
        }
        adj
    }
}
