//! Visiting order optimization
//!
//! Stops are ordered by area using [`AreaMap::transfer_cost`]. A
//! nearest-neighbour tour from the first stop seeds an open-path 2-opt
//! pass; the first stop never moves.

use tracing::debug;

use crate::region::AreaMap;

/// Pairwise transfer costs between the areas of a sequence of stops
#[must_use]
pub fn cost_matrix(areas: &[&str], area_map: &AreaMap) -> Vec<Vec<u32>> {
    areas
        .iter()
        .map(|from| {
            areas
                .iter()
                .map(|to| area_map.transfer_cost(from, to))
                .collect()
        })
        .collect()
}

/// Total cost of walking `path` in order
#[must_use]
pub fn path_cost(path: &[usize], costs: &[Vec<u32>]) -> u32 {
    path.windows(2).map(|pair| costs[pair[0]][pair[1]]).sum()
}

/// Greedy tour from stop 0; ties go to the lowest index
#[must_use]
pub fn nearest_neighbor(costs: &[Vec<u32>]) -> Vec<usize> {
    let n = costs.len();
    if n == 0 {
        return Vec::new();
    }

    let mut visited = vec![false; n];
    let mut path = Vec::with_capacity(n);
    let mut current = 0;
    visited[0] = true;
    path.push(0);

    while path.len() < n {
        let next = (0..n)
            .filter(|&candidate| !visited[candidate])
            .min_by_key(|&candidate| (costs[current][candidate], candidate));
        let Some(next) = next else { break };
        visited[next] = true;
        path.push(next);
        current = next;
    }
    path
}

/// Improve an open path with segment reversals until no move helps
pub fn two_opt(path: &mut [usize], costs: &[Vec<u32>]) {
    let n = path.len();
    if n < 3 {
        return;
    }

    let mut improved = true;
    while improved {
        improved = false;
        for i in 1..n - 1 {
            for j in i + 1..n {
                let before = costs[path[i - 1]][path[i]]
                    + if j + 1 < n { costs[path[j]][path[j + 1]] } else { 0 };
                let after = costs[path[i - 1]][path[j]]
                    + if j + 1 < n { costs[path[i]][path[j + 1]] } else { 0 };
                if after < before {
                    path[i..=j].reverse();
                    improved = true;
                }
            }
        }
    }
}

/// Reorder stops to reduce transfer time, keeping the first stop first.
///
/// Two stops or fewer come back unchanged.
pub fn order_by_area<T>(items: Vec<T>, area_of: impl Fn(&T) -> &str, area_map: &AreaMap) -> Vec<T> {
    if items.len() <= 2 {
        return items;
    }

    let areas: Vec<&str> = items.iter().map(&area_of).collect();
    let costs = cost_matrix(&areas, area_map);
    let mut path = nearest_neighbor(&costs);
    let seed_cost = path_cost(&path, &costs);
    two_opt(&mut path, &costs);
    debug!(
        "Route over {} stops: {} min after nearest neighbour, {} min after 2-opt",
        path.len(),
        seed_cost,
        path_cost(&path, &costs)
    );

    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    path.into_iter()
        .filter_map(|index| slots[index].take())
        .collect()
}
