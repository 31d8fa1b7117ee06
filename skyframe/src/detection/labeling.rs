//! Connected component labeling using union-find over run-length encoded rows.

/// Pixel adjacency used when joining runs across rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    /// Only horizontal and vertical neighbors are connected.
    #[default]
    Four,
    /// Diagonal neighbors are connected too.
    Eight,
}

/// A horizontal run of foreground pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Run {
    pub start: u32, // inclusive
    pub end: u32,   // exclusive
    label: u32,
}

impl Run {
    /// Window of previous-row columns that may touch this run. End is exclusive.
    #[inline]
    fn search_window(&self, connectivity: Connectivity) -> (u32, u32) {
        match connectivity {
            Connectivity::Four => (self.start, self.end),
            Connectivity::Eight => (self.start.saturating_sub(1), self.end + 1),
        }
    }
}

#[inline]
fn runs_connected(prev: &Run, curr: &Run, connectivity: Connectivity) -> bool {
    match connectivity {
        Connectivity::Four => prev.start < curr.end && prev.end > curr.start,
        Connectivity::Eight => prev.start < curr.end + 1 && prev.end + 1 > curr.start,
    }
}

/// Append the runs of row `y` where `is_set(x, y)` holds.
fn extract_runs_from_row(
    y: usize,
    width: usize,
    is_set: &mut impl FnMut(usize, usize) -> bool,
    runs: &mut Vec<Run>,
) {
    let mut start = None;
    for x in 0..width {
        match (is_set(x, y), start) {
            (true, None) => start = Some(x),
            (false, Some(s)) => {
                runs.push(Run {
                    start: s as u32,
                    end: x as u32,
                    label: 0,
                });
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push(Run {
            start: s as u32,
            end: width as u32,
            label: 0,
        });
    }
}

/// Give each run in `curr_runs` the label of a touching run in `prev_runs`,
/// unioning labels when it touches several, or a fresh label otherwise.
fn merge_runs_with_prev(
    curr_runs: &mut [Run],
    prev_runs: &[Run],
    connectivity: Connectivity,
    uf: &mut UnionFind,
) {
    let mut prev_idx = 0;
    for run in curr_runs.iter_mut() {
        let (search_start, search_end) = run.search_window(connectivity);

        while prev_idx < prev_runs.len() && prev_runs[prev_idx].end <= search_start {
            prev_idx += 1;
        }

        let mut assigned_label = None;
        let mut check_idx = prev_idx;
        while check_idx < prev_runs.len() && prev_runs[check_idx].start < search_end {
            let prev_run = &prev_runs[check_idx];
            if runs_connected(prev_run, run, connectivity) {
                match assigned_label {
                    Some(label) if label != prev_run.label => uf.union(label, prev_run.label),
                    None => assigned_label = Some(prev_run.label),
                    _ => {}
                }
            }
            check_idx += 1;
        }

        run.label = assigned_label.unwrap_or_else(|| uf.make_set());
    }
}

/// One run tagged with its row, in LOCAL coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct RowRun {
    pub y: u32,
    pub start: u32,
    pub end: u32,
}

/// Label the foreground of a `width × height` grid and return its connected
/// components.
///
/// Components are ordered by their first pixel in raster order, and each
/// component's runs are in raster order.
pub(super) fn label_components(
    width: usize,
    height: usize,
    connectivity: Connectivity,
    mut is_set: impl FnMut(usize, usize) -> bool,
) -> Vec<Vec<RowRun>> {
    let mut uf = UnionFind::new();
    let mut labeled: Vec<(u32, Run)> = Vec::new();
    let mut prev_runs: Vec<Run> = Vec::with_capacity(width / 4);
    let mut curr_runs: Vec<Run> = Vec::with_capacity(width / 4);

    for y in 0..height {
        curr_runs.clear();
        extract_runs_from_row(y, width, &mut is_set, &mut curr_runs);

        if curr_runs.is_empty() {
            prev_runs.clear();
            continue;
        }

        merge_runs_with_prev(&mut curr_runs, &prev_runs, connectivity, &mut uf);
        labeled.extend(curr_runs.iter().map(|&run| (y as u32, run)));

        std::mem::swap(&mut prev_runs, &mut curr_runs);
    }

    let label_map = uf.flatten();
    let num_labels = label_map.iter().copied().max().unwrap_or(0) as usize;
    let mut components: Vec<Vec<RowRun>> = vec![Vec::new(); num_labels];
    for (y, run) in labeled {
        let component = label_map[run.label as usize] as usize - 1;
        components[component].push(RowRun {
            y,
            start: run.start,
            end: run.end,
        });
    }
    components
}

// ============================================================================
// Union-Find
// ============================================================================

/// Union-find over provisional labels `1..`. Label 0 is background.
#[derive(Debug)]
struct UnionFind {
    parent: Vec<u32>,
    next_label: u32,
}

impl UnionFind {
    fn new() -> Self {
        Self {
            parent: Vec::with_capacity(256),
            next_label: 1,
        }
    }

    #[inline]
    fn make_set(&mut self) -> u32 {
        let label = self.next_label;
        self.parent.push(label);
        self.next_label += 1;
        label
    }

    /// Find root with iterative path compression (two-pass).
    fn find(&mut self, label: u32) -> u32 {
        let mut root = label;
        loop {
            let parent = self.parent[(root - 1) as usize];
            if parent == root {
                break;
            }
            root = parent;
        }

        let mut current = label;
        while current != root {
            let idx = (current - 1) as usize;
            let parent = self.parent[idx];
            self.parent[idx] = root;
            current = parent;
        }

        root
    }

    /// Merge two sets. The smaller label becomes the root.
    fn union(&mut self, a: u32, b: u32) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            let (smaller, larger) = if root_a < root_b {
                (root_a, root_b)
            } else {
                (root_b, root_a)
            };
            self.parent[(larger - 1) as usize] = smaller;
        }
    }

    /// Map every provisional label to a sequential final label `1..=n`,
    /// numbered in order of first appearance. Index 0 maps to 0.
    fn flatten(&mut self) -> Vec<u32> {
        let len = self.parent.len();
        let mut label_map = vec![0u32; len + 1];
        let mut num_labels = 0u32;

        for i in 1..=len as u32 {
            let root = self.find(i);
            if label_map[root as usize] == 0 {
                num_labels += 1;
                label_map[root as usize] = num_labels;
            }
            label_map[i as usize] = label_map[root as usize];
        }
        label_map
    }
}
