//! Adjacency, priors, and Graphviz dumps.
//!
//! Dump failures are logged and skipped; they never abort inference.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use super::CausalGraph;
use crate::categorical::{fmt_support, Categorical01};

impl<N> CausalGraph<N> {
    /// Write `<name>.causal.graph` and `<name>.priors.list` into `dir`.
    pub fn dump(&self, dir: &Path) {
        let graph_path = dir.join(format!("{}.causal.graph", self.name()));
        match self.write_adjacency(&graph_path) {
            Ok(()) => tracing::debug!(path = %graph_path.display(), "causal graph dumped"),
            Err(e) => tracing::error!(
                path = %graph_path.display(),
                error = %e,
                "failed to dump causal graph, skip"
            ),
        }
        let priors_path = dir.join(format!("{}.priors.list", self.name()));
        if let Err(e) = self.write_priors(&priors_path) {
            tracing::error!(path = %priors_path.display(), error = %e, "failed to dump priors list, skip");
        }
    }

    fn write_adjacency(&self, path: &Path) -> io::Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        for id in 0..self.node_size() {
            write!(w, "{id}\t")?;
            match self.dist_id_of(id) {
                Some(d) => write!(w, "{d}\t")?,
                None => write!(w, "D\t")?,
            }
            let (symbol, body) = match (self.sum(id), self.prod(id)) {
                (Some(body), _) => ('+', body),
                (None, Some(body)) => ('*', body),
                (None, None) => {
                    writeln!(w, "0")?;
                    continue;
                }
            };
            write!(w, "{}\t{symbol}", body.len())?;
            for sub in body {
                write!(w, "\t{sub}")?;
            }
            writeln!(w)?;
        }
        w.flush()
    }

    fn write_priors(&self, path: &Path) -> io::Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        for (i, dist) in self.distributions().iter().enumerate() {
            write!(w, "{i}\t{}", dist.supports().len())?;
            for (s, p) in dist.supports().iter().zip(dist.probabilities()) {
                write!(w, "\t{}\t{}", fmt_support(*s), fmt_support(*p))?;
            }
            writeln!(w)?;
        }
        w.flush()
    }

    /// Graphviz rendering: a parameter cluster, the template cluster `_x`,
    /// and one cluster per replica `0..num_repeats`.
    pub fn dump_dot(
        &self,
        path: &Path,
        node_repr: impl Fn(&N) -> String,
        dist_repr: impl Fn(&Categorical01) -> String,
        num_repeats: usize,
    ) {
        if let Err(e) = self.write_dot(path, &node_repr, &dist_repr, num_repeats) {
            tracing::error!(path = %path.display(), error = %e, "failed to dump .dot file, skip");
        }
    }

    fn write_dot(
        &self,
        path: &Path,
        node_repr: &dyn Fn(&N) -> String,
        dist_repr: &dyn Fn(&Categorical01) -> String,
        num_repeats: usize,
    ) -> io::Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        writeln!(w, "digraph G{{")?;
        writeln!(w, "subgraph cluster_prior {{")?;
        writeln!(w, "label=params;")?;
        for (d, dist) in self.distributions().iter().enumerate() {
            writeln!(
                w,
                "\tp{d} [label=\"{d}\n{}\",shape=box,style=filled];",
                dist_repr(dist)
            )?;
        }
        writeln!(w, "}}")?;
        self.write_dot_cluster(&mut w, node_repr, None)?;
        for trace in 0..num_repeats {
            self.write_dot_cluster(&mut w, node_repr, Some(trace))?;
        }
        writeln!(w, "}}")?;
        w.flush()
    }

    fn write_dot_cluster(
        &self,
        w: &mut impl Write,
        node_repr: &dyn Fn(&N) -> String,
        trace: Option<usize>,
    ) -> io::Result<()> {
        let suffix = trace.map_or_else(|| "_x".to_string(), |t| format!("_{t}"));
        writeln!(w, "\tsubgraph cluster{suffix} {{")?;
        writeln!(w, "\t\tlabel=\"trace{suffix}\";")?;
        for (id, node) in self.nodes().enumerate() {
            let mut label = node_repr(node);
            if trace.is_none() {
                label = format!("{}\n{label}", id + self.dist_size());
            }
            let shape = if self.is_prod(id) {
                "box"
            } else if self.is_sum(id) {
                "ellipse"
            } else {
                "ellipse,style=filled"
            };
            writeln!(w, "\t\tn{id}{suffix} [label=\"{label}\",shape={shape}];")?;
        }
        for (head, body) in self.sums() {
            for sub in body {
                writeln!(w, "\tn{sub}{suffix} -> n{head}{suffix} [style=dotted];")?;
            }
        }
        for (head, body) in self.prods() {
            for sub in body {
                writeln!(w, "\tn{sub}{suffix} -> n{head}{suffix};")?;
            }
        }
        for (node, dist) in self.stoch_nodes() {
            writeln!(w, "\tp{dist} -> n{node}{suffix} [style=bold];")?;
        }
        writeln!(w, "\t}}")
    }
}
