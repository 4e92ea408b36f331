//! Signature compiler
//!
//! For every signature of a schema, compiles the factorisation of the
//! evidence likelihood into a tree of present observables. Each present
//! observable is conditioned on its nearest present ancestor (its effective
//! parent), or on the hypothesis when no ancestor is present.
//!
//! The compiled table is indexed directly by signature mask and is shared
//! read-only by all inference calls.

use crate::error::InferenceError;
use crate::network::schema::{ObservableId, Schema};
use crate::network::signature::Signature;
use std::fmt;

/// How a compiled node's conditional is obtained
#[derive(Debug, Clone, PartialEq)]
pub enum Edge {
    /// Declared parent present, or a declared root
    Direct,
    /// Absent declared ancestors `a1..am` (nearest first) lie between the node
    /// and its effective parent; the conditional is chained through presence
    Derived { omitted: Vec<ObservableId> },
    /// Every declared ancestor absent; conditioned directly on the hypothesis
    Rerooted { omitted: Vec<ObservableId> },
}

/// One stored probability in a parameter vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Slot {
    /// p(hypothesis)
    Prior,
    /// p(x matches | parent matches) or p(x matches | parent does not match);
    /// `given == None` conditions on the hypothesis
    Conditional {
        observable: ObservableId,
        given: Option<ObservableId>,
        positive: bool,
    },
    /// p(x matches | a1 present)
    PresenceGiven {
        observable: ObservableId,
        present: ObservableId,
    },
    /// p(a_j present | a_j+1 present)
    PresenceLink {
        present: ObservableId,
        given_present: ObservableId,
    },
    /// p(a_m present | parent matches) or p(a_m present | parent does not match)
    Presence {
        present: ObservableId,
        given: ObservableId,
        positive: bool,
    },
}

impl Slot {
    /// Human-readable form using observable names
    pub fn describe(&self, schema: &Schema) -> String {
        let name = |id: ObservableId| schema.observable(id).name.as_str();
        let hypothesis = schema.hypothesis().name.as_str();
        let negate = |positive: bool| if positive { "" } else { "¬" };
        match *self {
            Slot::Prior => format!("p({})", hypothesis),
            Slot::Conditional {
                observable,
                given,
                positive,
            } => format!(
                "p({}|{}{})",
                name(observable),
                negate(positive),
                given.map(name).unwrap_or(hypothesis)
            ),
            Slot::PresenceGiven {
                observable,
                present,
            } => format!("p({}|{}+)", name(observable), name(present)),
            Slot::PresenceLink {
                present,
                given_present,
            } => format!("p({}+|{}+)", name(present), name(given_present)),
            Slot::Presence {
                present,
                given,
                positive,
            } => format!("p({}+|{}{})", name(present), negate(positive), name(given)),
        }
    }
}

/// A present observable in a compiled signature
#[derive(Debug, Clone)]
pub struct Node {
    pub observable: ObservableId,
    /// Index of the effective parent node; `None` is the hypothesis
    pub parent: Option<usize>,
    pub edge: Edge,
    pub children: Vec<usize>,
    /// First stored slot of this node in the parameter vector
    pub offset: usize,
    pub width: usize,
}

/// Factorisation for one signature; nodes are ordered parents first
#[derive(Debug, Clone)]
pub struct CompiledSignature {
    signature: Signature,
    nodes: Vec<Node>,
    roots: Vec<usize>,
    slots: Vec<Slot>,
}

impl CompiledSignature {
    fn compile(schema: &Schema, signature: Signature) -> Self {
        let mut nodes: Vec<Node> = Vec::new();
        let mut node_of: Vec<Option<usize>> = vec![None; schema.len()];
        let mut roots = Vec::new();
        let mut slots = vec![Slot::Prior];

        for &id in schema.topological() {
            if !schema.is_present(id, signature) {
                continue;
            }

            let mut omitted = Vec::new();
            let mut effective = None;
            let mut ancestor = schema.observable(id).parent;
            while let Some(a) = ancestor {
                if schema.is_present(a, signature) {
                    effective = Some(a);
                    break;
                }
                omitted.push(a);
                ancestor = schema.observable(a).parent;
            }

            let offset = slots.len();
            let edge = match (effective, omitted.is_empty()) {
                (_, true) => {
                    for positive in [true, false] {
                        slots.push(Slot::Conditional {
                            observable: id,
                            given: effective,
                            positive,
                        });
                    }
                    Edge::Direct
                }
                (Some(parent), false) => {
                    slots.push(Slot::PresenceGiven {
                        observable: id,
                        present: omitted[0],
                    });
                    for pair in omitted.windows(2) {
                        slots.push(Slot::PresenceLink {
                            present: pair[0],
                            given_present: pair[1],
                        });
                    }
                    let last = omitted[omitted.len() - 1];
                    for positive in [true, false] {
                        slots.push(Slot::Presence {
                            present: last,
                            given: parent,
                            positive,
                        });
                    }
                    Edge::Derived { omitted }
                }
                (None, false) => {
                    for positive in [true, false] {
                        slots.push(Slot::Conditional {
                            observable: id,
                            given: None,
                            positive,
                        });
                    }
                    Edge::Rerooted { omitted }
                }
            };

            let index = nodes.len();
            let parent = effective.and_then(|p| node_of[p.index()]);
            match parent {
                Some(p) => nodes[p].children.push(index),
                None => roots.push(index),
            }
            node_of[id.index()] = Some(index);
            nodes.push(Node {
                observable: id,
                parent,
                edge,
                children: Vec::new(),
                offset,
                width: slots.len() - offset,
            });
        }

        Self {
            signature,
            nodes,
            roots,
            slots,
        }
    }

    pub fn signature(&self) -> Signature {
        self.signature
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Stored slots, prior first, in parameter vector order
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn stored_len(&self) -> usize {
        self.slots.len()
    }
}

/// A schema together with its compiled signature table
#[derive(Debug)]
pub struct CompiledNetwork {
    schema: Schema,
    signatures: Vec<CompiledSignature>,
}

impl CompiledNetwork {
    /// Enumerate and compile every signature of the schema
    pub fn compile(schema: Schema) -> Self {
        let width = schema.optional().len();
        let signatures = (0..(1u32 << width))
            .map(|mask| CompiledSignature::compile(&schema, Signature::new(mask, width)))
            .collect();
        Self { schema, signatures }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    pub fn get(&self, signature: Signature) -> Result<&CompiledSignature, InferenceError> {
        if signature.width() != self.schema.optional().len() {
            return Err(InferenceError::SignatureNotFound(signature.to_string()));
        }
        self.signatures
            .get(signature.mask() as usize)
            .ok_or_else(|| InferenceError::SignatureNotFound(signature.to_string()))
    }
}

impl fmt::Display for CompiledNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} observables, {} signatures",
            self.schema.len(),
            self.signatures.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::schema::{ObservableDef, SchemaBuilder};

    // taxonId -> kingdom -> phylum -> class, plus required name as a root
    fn chain() -> CompiledNetwork {
        let schema = SchemaBuilder::new()
            .hypothesis(ObservableDef::required("taxonId"))
            .observable(ObservableDef::optional("kingdom"))
            .observable(ObservableDef::optional("phylum").depends_on("kingdom"))
            .observable(ObservableDef::optional("class").depends_on("phylum"))
            .observable(ObservableDef::required("scientificName"))
            .build()
            .unwrap();
        CompiledNetwork::compile(schema)
    }

    fn names(network: &CompiledNetwork, compiled: &CompiledSignature) -> Vec<String> {
        compiled
            .nodes()
            .iter()
            .map(|n| network.schema().observable(n.observable).name.clone())
            .collect()
    }

    #[test]
    fn test_table_size() {
        let network = chain();
        assert_eq!(network.len(), 8);
    }

    #[test]
    fn test_all_present_is_direct() {
        let network = chain();
        let compiled = network.get("TTT".parse().unwrap()).unwrap();
        assert_eq!(names(&network, compiled), vec!["kingdom", "phylum", "class", "scientificName"]);
        assert!(compiled.nodes().iter().all(|n| n.edge == Edge::Direct));
        // prior + 2 per node
        assert_eq!(compiled.stored_len(), 9);
        assert_eq!(compiled.roots(), &[0, 3]);
        assert_eq!(compiled.nodes()[2].parent, Some(1));
    }

    #[test]
    fn test_absent_intermediate_is_derived() {
        let network = chain();
        let compiled = network.get("TFT".parse().unwrap()).unwrap();
        let class = &compiled.nodes()[1];
        let phylum = network.schema().require("phylum").unwrap();
        assert_eq!(class.edge, Edge::Derived { omitted: vec![phylum] });
        assert_eq!(class.parent, Some(0));
        // p(class|phylum+), p(phylum+|kingdom), p(phylum+|¬kingdom)
        assert_eq!(class.width, 3);
        assert_eq!(
            compiled.slots()[class.offset].describe(network.schema()),
            "p(class|phylum+)"
        );
        assert_eq!(
            compiled.slots()[class.offset + 2].describe(network.schema()),
            "p(phylum+|¬kingdom)"
        );
    }

    #[test]
    fn test_no_present_ancestor_is_rerooted() {
        let network = chain();
        let compiled = network.get("FFT".parse().unwrap()).unwrap();
        let class = &compiled.nodes()[0];
        assert!(matches!(class.edge, Edge::Rerooted { ref omitted } if omitted.len() == 2));
        assert_eq!(class.parent, None);
        assert_eq!(
            compiled.slots()[class.offset].describe(network.schema()),
            "p(class|taxonId)"
        );
    }

    #[test]
    fn test_wrong_width_not_found() {
        let network = chain();
        let result = network.get("TT".parse().unwrap());
        assert_eq!(
            result.unwrap_err(),
            InferenceError::SignatureNotFound("TT".to_string())
        );
    }
}
