//! Triangular 6.6.6 color code patches.
//!
//! Sites are points `(i, j)` of a triangular lattice with `i + j <= 3(d-1)/2`.
//! Points with `(i - j) mod 3 == 1` are face centres, every other point is a
//! data qubit. Each face is measured twice, by one X ancilla and one Z
//! ancilla over the same data qubits.

use std::collections::{BTreeMap, BTreeSet};

use qcraft_ir::QubitGraph;

use crate::code_space::{
    CodeSpace, LogicalOperators, QubitRole, QubitSite, Stabilizer, StabilizerMap,
};

const NEIGHBORS: [(i32, i32); 6] = [(1, 0), (-1, 0), (0, 1), (0, -1), (1, -1), (-1, 1)];

fn is_face(i: i32, j: i32) -> bool {
    (i - j).rem_euclid(3) == 1
}

/// Build a color code patch of odd distance `distance`.
pub(crate) fn color_patch(distance: u32, supported_logical_gates: BTreeSet<String>) -> CodeSpace {
    let side = 3 * (distance as i32 - 1) / 2;
    let mut data_ids: BTreeMap<(i32, i32), u32> = BTreeMap::new();
    let mut faces = Vec::new();
    let mut data_in_order = Vec::new();
    for j in 0..=side {
        for i in 0..=(side - j) {
            if is_face(i, j) {
                faces.push((i, j));
            } else {
                data_ids.insert((i, j), data_in_order.len() as u32);
                data_in_order.push((i, j));
            }
        }
    }

    let num_data = data_in_order.len() as u32;
    let num_faces = faces.len() as u32;
    let mut qubit_layout = BTreeMap::new();
    let mut adjacency = QubitGraph::new();
    for (q, &(i, j)) in data_in_order.iter().enumerate() {
        qubit_layout.insert(q as u32, QubitSite::new(2 * i + j, j, QubitRole::Data));
        adjacency.add_node(q as u32);
    }

    let mut stabilizer_map = StabilizerMap::default();
    for (k, &(i, j)) in faces.iter().enumerate() {
        let mut support: Vec<u32> = NEIGHBORS
            .iter()
            .filter_map(|&(di, dj)| data_ids.get(&(i + di, j + dj)).copied())
            .collect();
        support.sort_unstable();

        let x_ancilla = num_data + k as u32;
        let z_ancilla = num_data + num_faces + k as u32;
        qubit_layout.insert(x_ancilla, QubitSite::new(2 * i + j, j, QubitRole::AncillaX));
        qubit_layout.insert(z_ancilla, QubitSite::new(2 * i + j + 1, j, QubitRole::AncillaZ));
        for &q in &support {
            adjacency.add_edge(x_ancilla, q);
            adjacency.add_edge(z_ancilla, q);
        }
        stabilizer_map.x.push(Stabilizer {
            ancilla: x_ancilla,
            data_qubits: support.clone(),
        });
        stabilizer_map.z.push(Stabilizer {
            ancilla: z_ancilla,
            data_qubits: support,
        });
    }

    let bottom_row: Vec<u32> = data_in_order
        .iter()
        .zip(0u32..)
        .filter(|((_, j), _)| *j == 0)
        .map(|(_, q)| q)
        .collect();

    CodeSpace {
        family: String::new(),
        layout_type: "color".to_string(),
        code_distance: distance,
        qubit_layout,
        stabilizer_map,
        logical_operators: LogicalOperators {
            x: bottom_row.clone(),
            z: bottom_row,
        },
        adjacency,
        supported_logical_gates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlap(a: &[u32], b: &[u32]) -> usize {
        a.iter().filter(|q| b.contains(q)).count()
    }

    #[test]
    fn test_distance_three_is_steane_code() {
        let cs = color_patch(3, BTreeSet::new());
        assert_eq!(cs.data_qubits().len(), 7);
        assert_eq!(cs.stabilizer_map.x.len(), 3);
        assert!(cs.stabilizer_map.iter().all(|s| s.data_qubits.len() == 4));
        assert_eq!(cs.logical_operators.x.len(), 3);
        assert!(cs.validate().is_ok());
    }

    #[test]
    fn test_stabilizers_commute_and_logicals_anticommute() {
        for d in [3, 5, 7] {
            let cs = color_patch(d, BTreeSet::new());
            for sx in &cs.stabilizer_map.x {
                for sz in &cs.stabilizer_map.z {
                    assert_eq!(overlap(&sx.data_qubits, &sz.data_qubits) % 2, 0);
                }
                assert_eq!(overlap(&sx.data_qubits, &cs.logical_operators.z) % 2, 0);
            }
            assert_eq!(
                overlap(&cs.logical_operators.x, &cs.logical_operators.z) % 2,
                1
            );
        }
    }

    #[test]
    fn test_fits_capacity_formula() {
        for d in [3u32, 5, 7] {
            let cs = color_patch(d, BTreeSet::new());
            assert!(cs.num_qubits() as u32 <= (3 * d * d + 1) / 2);
        }
    }
}
