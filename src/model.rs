//! Problem - the explicit context holding one finite element model
//!
//! A `Problem` goes through a create / populate / run / dispose lifecycle:
//! [`Problem::new`] registers the built-in element definitions, the `add_*`
//! methods (or [`crate::input::load_model`]) populate it, the pipeline runs
//! one analysis over it and [`Problem::dispose`] tears it down.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::analysis::AnalysisParameters;
use crate::definitions::{Definition, DefinitionRegistry};
use crate::dofs::DofMap;
use crate::elements::{Constraint, Element, ElementId, Material, Node, NodeId, MAX_DISTRIBUTED_LOADS};
use crate::error::{FeltError, FeltResult};
use crate::loads::{DistributedLoad, Force, LoadCase};

/// A finite element problem
#[derive(Debug, Clone)]
pub struct Problem {
    /// Problem title
    pub title: String,
    /// Element formulations available to this problem
    pub definitions: DefinitionRegistry,
    /// Nodes in input order
    pub nodes: Vec<Node>,
    /// Elements in input order
    pub elements: Vec<Element>,
    pub materials: BTreeMap<String, Arc<Material>>,
    pub constraints: BTreeMap<String, Arc<Constraint>>,
    pub forces: BTreeMap<String, Arc<Force>>,
    pub loads: BTreeMap<String, Arc<DistributedLoad>>,
    /// Load cases in declaration order
    pub load_cases: Vec<LoadCase>,
    /// Analysis configuration
    pub analysis: AnalysisParameters,

    pub(crate) dof_map: DofMap,
    node_index: HashMap<u32, NodeId>,
    element_index: HashMap<u32, ElementId>,
}

impl Default for Problem {
    fn default() -> Self {
        Self::new("")
    }
}

impl Problem {
    /// Create an empty problem with the built-in element definitions registered
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            definitions: DefinitionRegistry::with_builtins(),
            nodes: Vec::new(),
            elements: Vec::new(),
            materials: BTreeMap::new(),
            constraints: BTreeMap::new(),
            forces: BTreeMap::new(),
            loads: BTreeMap::new(),
            load_cases: Vec::new(),
            analysis: AnalysisParameters::default(),
            dof_map: DofMap::default(),
            node_index: HashMap::new(),
            element_index: HashMap::new(),
        }
    }

    // ========================
    // Named templates
    // ========================

    /// Register an additional element definition
    pub fn register_definition(&mut self, definition: Definition) -> FeltResult<Arc<Definition>> {
        self.definitions.register(definition)
    }

    /// Add a material
    pub fn add_material(&mut self, material: Material) -> FeltResult<Arc<Material>> {
        insert_named(&mut self.materials, material.name.clone(), material)
    }

    /// Add a constraint
    pub fn add_constraint(&mut self, constraint: Constraint) -> FeltResult<Arc<Constraint>> {
        insert_named(&mut self.constraints, constraint.name.clone(), constraint)
    }

    /// Add a force
    pub fn add_force(&mut self, force: Force) -> FeltResult<Arc<Force>> {
        insert_named(&mut self.forces, force.name.clone(), force)
    }

    /// Add a distributed load
    pub fn add_load(&mut self, load: DistributedLoad) -> FeltResult<Arc<DistributedLoad>> {
        insert_named(&mut self.loads, load.name.clone(), load)
    }

    // ========================
    // Mesh
    // ========================

    /// Add a node
    pub fn add_node(&mut self, number: u32, x: f64, y: f64, z: f64) -> FeltResult<NodeId> {
        if self.node_index.contains_key(&number) {
            return Err(FeltError::DuplicateNode(number));
        }
        let id = self.nodes.len();
        let mut node = Node::new(number, x, y, z);
        node.eq_position = id;
        self.nodes.push(node);
        self.node_index.insert(number, id);
        Ok(id)
    }

    /// Assign a named constraint to a node
    pub fn constrain_node(&mut self, number: u32, constraint: &str) -> FeltResult<()> {
        let constraint = self
            .constraints
            .get(constraint)
            .cloned()
            .ok_or_else(|| FeltError::ConstraintNotFound(constraint.to_string()))?;
        let id = self.require_node(number)?;
        self.nodes[id].constraint = Some(constraint);
        Ok(())
    }

    /// Assign a named force to a node
    pub fn apply_force(&mut self, number: u32, force: &str) -> FeltResult<()> {
        let force = self
            .forces
            .get(force)
            .cloned()
            .ok_or_else(|| FeltError::ForceNotFound(force.to_string()))?;
        let id = self.require_node(number)?;
        self.nodes[id].force = Some(force);
        Ok(())
    }

    /// Add an element of a registered definition.
    ///
    /// Fails on a duplicate number, an unknown definition, a node count that
    /// does not match the definition, an unknown node or an unknown material.
    pub fn add_element(
        &mut self,
        number: u32,
        definition: &str,
        nodes: &[u32],
        material: &str,
    ) -> FeltResult<ElementId> {
        if self.element_index.contains_key(&number) {
            return Err(FeltError::DuplicateElement(number));
        }
        let definition = self
            .definitions
            .lookup(definition)
            .ok_or_else(|| FeltError::DefinitionNotFound(definition.to_string()))?;
        if nodes.len() != definition.num_nodes {
            return Err(FeltError::InvalidElement {
                element: number,
                message: format!(
                    "{} elements need {} nodes, got {}",
                    definition.name,
                    definition.num_nodes,
                    nodes.len()
                ),
            });
        }
        let node_ids = nodes
            .iter()
            .map(|&n| self.require_node(n))
            .collect::<FeltResult<Vec<_>>>()?;
        let material = self
            .materials
            .get(material)
            .cloned()
            .ok_or_else(|| FeltError::MaterialNotFound(material.to_string()))?;

        let id = self.elements.len();
        self.elements
            .push(Element::new(number, definition, node_ids, material));
        self.element_index.insert(number, id);
        Ok(id)
    }

    /// Apply a named distributed load to an element
    pub fn add_element_load(&mut self, number: u32, load: &str) -> FeltResult<()> {
        let load = self
            .loads
            .get(load)
            .cloned()
            .ok_or_else(|| FeltError::LoadNotFound(load.to_string()))?;
        let id = self.require_element(number)?;
        let element = &mut self.elements[id];
        check_element_load(element, element.loads.len())?;
        element.loads.push(load);
        Ok(())
    }

    /// Add a load case; node, element, force and load names must exist
    pub fn add_load_case(
        &mut self,
        name: &str,
        forces: &[(u32, &str)],
        loads: &[(u32, &str)],
    ) -> FeltResult<()> {
        if self.load_cases.iter().any(|case| case.name == name) {
            return Err(FeltError::DuplicateName(name.to_string()));
        }
        let mut case = LoadCase::new(name);
        for &(node, force) in forces {
            let force = self
                .forces
                .get(force)
                .cloned()
                .ok_or_else(|| FeltError::ForceNotFound(force.to_string()))?;
            case.forces.push((self.require_node(node)?, force));
        }
        for &(element, load) in loads {
            let load = self
                .loads
                .get(load)
                .cloned()
                .ok_or_else(|| FeltError::LoadNotFound(load.to_string()))?;
            let id = self.require_element(element)?;
            let count = case.loads.iter().filter(|(e, _)| *e == id).count();
            check_element_load(&self.elements[id], count)?;
            case.loads.push((id, load));
        }
        self.load_cases.push(case);
        Ok(())
    }

    // ========================
    // Queries
    // ========================

    /// Index of the node with a given number
    pub fn node_id(&self, number: u32) -> Option<NodeId> {
        self.node_index.get(&number).copied()
    }

    /// Index of the element with a given number
    pub fn element_id(&self, number: u32) -> Option<ElementId> {
        self.element_index.get(&number).copied()
    }

    pub fn node(&self, number: u32) -> Option<&Node> {
        self.node_id(number).map(|id| &self.nodes[id])
    }

    pub fn element(&self, number: u32) -> Option<&Element> {
        self.element_id(number).map(|id| &self.elements[id])
    }

    /// Active DOFs found by [`crate::dofs::find_active_dofs`]
    pub fn dof_map(&self) -> &DofMap {
        &self.dof_map
    }

    /// Number of global equations in the current DOF map
    pub fn num_equations(&self) -> usize {
        self.nodes.len() * self.dof_map.num_dofs()
    }

    /// Whether any material carries Rayleigh damping
    pub fn is_damped(&self) -> bool {
        self.elements.iter().any(|e| e.material.is_damped())
    }

    /// Release every entity of the problem
    pub fn dispose(self) {
        log::debug!(
            "disposing problem '{}' ({} nodes, {} elements)",
            self.title,
            self.nodes.len(),
            self.elements.len()
        );
    }

    fn require_node(&self, number: u32) -> FeltResult<NodeId> {
        self.node_id(number).ok_or(FeltError::NodeNotFound(number))
    }

    fn require_element(&self, number: u32) -> FeltResult<ElementId> {
        self.element_id(number)
            .ok_or(FeltError::ElementNotFound(number))
    }
}

fn insert_named<T>(map: &mut BTreeMap<String, Arc<T>>, name: String, value: T) -> FeltResult<Arc<T>> {
    if map.contains_key(&name) {
        return Err(FeltError::DuplicateName(name));
    }
    let value = Arc::new(value);
    map.insert(name, Arc::clone(&value));
    Ok(value)
}

fn check_element_load(element: &Element, current: usize) -> FeltResult<()> {
    if !element.definition.accepts_loads {
        return Err(FeltError::InvalidElement {
            element: element.number,
            message: format!("{} elements do not take distributed loads", element.definition.name),
        });
    }
    if current >= MAX_DISTRIBUTED_LOADS {
        return Err(FeltError::InvalidElement {
            element: element.number,
            message: format!("at most {} distributed loads per element", MAX_DISTRIBUTED_LOADS),
        });
    }
    Ok(())
}
