//! Square-lattice surface code patches.
//!
//! Data qubit `(x, y)` for `x, y in 0..d` has id `y * d + x`. Plaquette
//! `(x, y)` for `x, y in -1..d-1` covers the data qubits at its four corners
//! and is X-type when `x + y` is even. All interior plaquettes are kept;
//! boundary plaquettes are kept as weight-2 checks, X-type on the top and
//! bottom edges and Z-type on the left and right edges. That gives `d^2` data
//! and `d^2 - 1` ancilla qubits, `2d^2 - 1` in total.
//!
//! Logical X runs down the column `x = 0`, logical Z along the row `y = 0`.

use std::collections::{BTreeMap, BTreeSet};

use qcraft_ir::QubitGraph;

use crate::code_space::{
    CodeSpace, LogicalOperators, QubitRole, QubitSite, Stabilizer, StabilizerMap,
};

const CORNERS: [(i32, i32); 4] = [(0, 0), (1, 0), (0, 1), (1, 1)];

/// Build a surface code patch.
///
/// With `rotate_frame` the coordinates are turned by 45 degrees
/// (`(x, y) -> (x - y, x + y)`); connectivity is unchanged.
pub(crate) fn surface_patch(
    layout_type: &str,
    distance: u32,
    rotate_frame: bool,
    supported_logical_gates: BTreeSet<String>,
) -> CodeSpace {
    let d = distance as i32;
    let data_id = |x: i32, y: i32| (y * d + x) as u32;
    let place = |x: i32, y: i32| {
        if rotate_frame { (x - y, x + y) } else { (x, y) }
    };

    let mut qubit_layout = BTreeMap::new();
    let mut adjacency = QubitGraph::new();
    for y in 0..d {
        for x in 0..d {
            let (px, py) = place(2 * x, 2 * y);
            let q = data_id(x, y);
            qubit_layout.insert(q, QubitSite::new(px, py, QubitRole::Data));
            adjacency.add_node(q);
        }
    }

    let mut stabilizer_map = StabilizerMap::default();
    let mut next_ancilla = distance * distance;
    for y in -1..d {
        for x in -1..d {
            let support: Vec<u32> = CORNERS
                .iter()
                .map(|&(dx, dy)| (x + dx, y + dy))
                .filter(|&(cx, cy)| (0..d).contains(&cx) && (0..d).contains(&cy))
                .map(|(cx, cy)| data_id(cx, cy))
                .collect();
            let x_type = (x + y).rem_euclid(2) == 0;
            let interior = x >= 0 && y >= 0 && x < d - 1 && y < d - 1;
            let keep = interior
                || (support.len() == 2
                    && (((y == -1 || y == d - 1) && x_type)
                        || ((x == -1 || x == d - 1) && !x_type)));
            if !keep {
                continue;
            }

            let ancilla = next_ancilla;
            next_ancilla += 1;
            let role = if x_type {
                QubitRole::AncillaX
            } else {
                QubitRole::AncillaZ
            };
            let (px, py) = place(2 * x + 1, 2 * y + 1);
            qubit_layout.insert(ancilla, QubitSite::new(px, py, role));
            for &q in &support {
                adjacency.add_edge(ancilla, q);
            }
            let stab = Stabilizer {
                ancilla,
                data_qubits: support,
            };
            if x_type {
                stabilizer_map.x.push(stab);
            } else {
                stabilizer_map.z.push(stab);
            }
        }
    }

    let logical_operators = LogicalOperators {
        x: (0..d).map(|y| data_id(0, y)).collect(),
        z: (0..d).map(|x| data_id(x, 0)).collect(),
    };

    CodeSpace {
        family: String::new(),
        layout_type: layout_type.to_string(),
        code_distance: distance,
        qubit_layout,
        stabilizer_map,
        logical_operators,
        adjacency,
        supported_logical_gates,
    }
}
