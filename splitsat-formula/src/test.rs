//! Formula generators for tests.
use proptest::{prelude::*, *};

use rand::distributions::Bernoulli;
use rand::seq::SliceRandom;

use crate::cnf::CnfFormula;
use crate::lit::Lit;

/// Generate small hard unsatisfiable instances.
///
/// Builds the sgen1 construction (http://www.cs.qub.ac.uk/~i.spence/sgen/) over
/// `4 * blocks + 1` variables with randomly chosen partitions and polarities. The two inverted
/// rounds demand majorities of opposite polarity, so the result is unsatisfiable for every
/// block count.
pub fn sgen_unsat_formula(
    blocks: impl Strategy<Value = usize>,
) -> impl Strategy<Value = CnfFormula> {
    blocks.prop_flat_map(|blocks| {
        collection::vec(bool::ANY, blocks * 4 + 1).prop_perturb(|polarity, mut rng| {
            let mut clauses: Vec<Vec<Lit>> = vec![];
            let mut lits = polarity
                .into_iter()
                .enumerate()
                .map(|(index, negative)| Lit::from_index(index, negative))
                .collect::<Vec<_>>();

            for &flip in [false, true].iter() {
                lits.shuffle(&mut rng);

                // Every triple out of a group of four: at most two literals per group may be
                // false in this round.
                for group in lits.chunks_exact(4) {
                    for i in 0..4 {
                        for j in 0..i {
                            for k in 0..j {
                                let mut clause =
                                    vec![group[i] ^ flip, group[j] ^ flip, group[k] ^ flip];
                                clause.shuffle(&mut rng);
                                clauses.push(clause);
                            }
                        }
                    }
                }

                // The leftover literal is tied to every pair of the first group.
                let &last = lits.last().unwrap();
                for j in 0..4 {
                    for k in 0..j {
                        let mut clause = vec![last ^ flip, lits[j] ^ flip, lits[k] ^ flip];
                        clause.shuffle(&mut rng);
                        clauses.push(clause);
                    }
                }
            }

            clauses.shuffle(&mut rng);
            CnfFormula::from(clauses)
        })
    })
}

/// Generate a satisfiable instance.
///
/// This generates a random full assignment and then only generates clauses compatible with that
/// assignment, so the result is satisfiable by construction.
pub fn sat_formula(
    vars: impl Strategy<Value = usize>,
    clause_count: impl Strategy<Value = usize>,
    density: impl Strategy<Value = f64>,
    polarity_dist: impl Strategy<Value = f64>,
) -> impl Strategy<Value = CnfFormula> {
    (vars, clause_count, density, polarity_dist).prop_flat_map(
        |(vars, clause_count, density, polarity_dist)| {
            let density = Bernoulli::new(density);
            let polarity_dist = Bernoulli::new(polarity_dist);

            collection::vec(bool::ANY, vars).prop_perturb(move |polarity, mut rng| {
                let mut clauses: Vec<Vec<Lit>> = vec![];
                let lits = polarity
                    .into_iter()
                    .enumerate()
                    .map(|(index, polarity)| Lit::from_index(index, polarity))
                    .collect::<Vec<_>>();

                for _ in 0..clause_count {
                    // Each clause keeps one literal of the hidden assignment, so it stays
                    // satisfiable no matter what else is sampled into it.
                    let &fixed_lit = lits.choose(&mut rng).unwrap();
                    let mut clause = vec![fixed_lit];
                    for &lit in lits.iter() {
                        if lit != fixed_lit && rng.sample(density) {
                            clause.push(lit ^ rng.sample(polarity_dist));
                        }
                    }
                    clause.shuffle(&mut rng);
                    clauses.push(clause);
                }

                clauses.shuffle(&mut rng);
                CnfFormula::from(clauses)
            })
        },
    )
}

/// Generate a pigeon hole principle instance.
///
/// Places `holes + 1` pigeons into `holes` holes, which is unsatisfiable for every positive
/// number of holes. Variable `i * holes + j` is true when pigeon `i` sits in hole `j`.
pub fn pigeon_hole_formula(holes: impl Strategy<Value = usize>) -> impl Strategy<Value = CnfFormula> {
    holes.prop_flat_map(|holes| {
        let pigeons = holes + 1;

        Just(()).prop_perturb(move |_, mut rng| {
            let mut clauses: Vec<Vec<Lit>> = vec![];

            let lit = |pigeon: usize, hole: usize, negative: bool| {
                Lit::from_index(pigeon * holes + hole, negative)
            };

            for pigeon in 0..pigeons {
                let mut clause: Vec<_> = (0..holes).map(|hole| lit(pigeon, hole, false)).collect();
                clause.shuffle(&mut rng);
                clauses.push(clause);
            }

            for hole in 0..holes {
                for pigeon_a in 0..pigeons {
                    for pigeon_b in 0..pigeon_a {
                        let mut clause = vec![lit(pigeon_a, hole, true), lit(pigeon_b, hole, true)];
                        clause.shuffle(&mut rng);
                        clauses.push(clause);
                    }
                }
            }

            clauses.shuffle(&mut rng);
            CnfFormula::from(clauses)
        })
    })
}
