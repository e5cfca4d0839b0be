//! Flows as the engine runs them.
//!
//! A [`FlowDef`] is read into a [`Flow`] by decoding every action and wait
//! through the registries and checking the graph. Anything structurally
//! wrong is reported here, before a run is ever created.

use std::collections::{HashMap, HashSet};

use sluice_assets::{AssetReference, FlowReference};
use sluice_config::{ExitDef, FlowDef, RouterDef};

use crate::actions::Action;
use crate::assets::SessionAssets;
use crate::error::{FlowError, ValidationError};
use crate::registry::{Registries, Typed};
use crate::results::{ResultInfo, merge_result_infos};
use crate::switch;
use crate::waits::Wait;

#[derive(Debug)]
pub struct Node {
  pub uuid: String,
  pub actions: Vec<Box<dyn Action>>,
  pub router: Option<RouterDef>,
  pub wait: Option<Box<dyn Wait>>,
  pub exits: Vec<ExitDef>,
}

impl Node {
  pub fn exit(&self, uuid: &str) -> Option<&ExitDef> {
    self.exits.iter().find(|e| e.uuid == uuid)
  }
}

/// A reference to an asset found in a flow, and where it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedReference {
  pub node_uuid: String,
  pub action_uuid: Option<String>,
  pub reference: AssetReference,
}

#[derive(Debug)]
pub struct Flow {
  pub uuid: String,
  pub name: String,
  pub language: String,
  pub expire_after_minutes: Option<u32>,
  pub nodes: Vec<Node>,
}

impl Flow {
  /// Read a definition, decoding actions and waits with `registries`.
  pub fn from_def(def: FlowDef, registries: &Registries) -> Result<Self, FlowError> {
    if def.nodes.is_empty() {
      return Err(FlowError::NoNodes);
    }

    let mut node_uuids = HashSet::new();
    let mut exit_uuids = HashSet::new();
    for node in &def.nodes {
      if !node_uuids.insert(node.uuid.as_str()) {
        return Err(FlowError::DuplicateNode(node.uuid.clone()));
      }
      for exit in &node.exits {
        if !exit_uuids.insert(exit.uuid.as_str()) {
          return Err(FlowError::DuplicateExit(exit.uuid.clone()));
        }
      }
    }

    for node in &def.nodes {
      for exit in &node.exits {
        if let Some(destination) = &exit.destination_node_uuid
          && !node_uuids.contains(destination.as_str())
        {
          return Err(FlowError::UnknownDestination {
            exit_uuid: exit.uuid.clone(),
            destination: destination.clone(),
          });
        }
      }
      if let Some(router) = &node.router {
        validate_router(&node.uuid, router, &node.exits)?;
      }
    }

    let mut nodes = Vec::with_capacity(def.nodes.len());
    for node in def.nodes {
      let actions = node
        .actions
        .into_iter()
        .map(|a| registries.actions.decode(a))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| FlowError::Action {
          node_uuid: node.uuid.clone(),
          source,
        })?;

      let wait = node
        .wait
        .map(|w| registries.waits.decode(w))
        .transpose()
        .map_err(|source| FlowError::Wait {
          node_uuid: node.uuid.clone(),
          source,
        })?;

      nodes.push(Node {
        uuid: node.uuid,
        actions,
        router: node.router,
        wait,
        exits: node.exits,
      });
    }

    let flow = Self {
      uuid: def.uuid,
      name: def.name,
      language: def.language,
      expire_after_minutes: def.expire_after_minutes,
      nodes,
    };
    flow.detect_waitless_cycle()?;
    Ok(flow)
  }

  pub fn reference(&self) -> FlowReference {
    FlowReference::new(&self.uuid, &self.name)
  }

  pub fn node(&self, uuid: &str) -> Option<&Node> {
    self.nodes.iter().find(|n| n.uuid == uuid)
  }

  /// The node a run of this flow starts at.
  pub fn entry(&self) -> Option<&Node> {
    self.nodes.first()
  }

  /// Check every action against the assets.
  pub fn validate(&self, assets: &SessionAssets) -> Result<(), ValidationError> {
    for node in &self.nodes {
      for action in &node.actions {
        action
          .validate(assets)
          .map_err(|source| ValidationError::Flow {
            flow_uuid: self.uuid.clone(),
            source: Box::new(ValidationError::Action {
              uuid: action.uuid().to_string(),
              action_type: action.type_name(),
              source,
            }),
          })?;
      }
    }
    Ok(())
  }

  /// Every asset reference made by the flow's actions, in node order.
  pub fn extract_references(&self) -> Vec<ExtractedReference> {
    let mut refs = Vec::new();
    for node in &self.nodes {
      for action in &node.actions {
        for reference in action.references() {
          refs.push(ExtractedReference {
            node_uuid: node.uuid.clone(),
            action_uuid: Some(action.uuid().to_string()),
            reference,
          });
        }
      }
    }
    refs
  }

  /// Flows this flow can enter.
  pub fn sub_flows(&self) -> Vec<FlowReference> {
    let mut seen = HashSet::new();
    self
      .extract_references()
      .into_iter()
      .filter_map(|r| match r.reference {
        AssetReference::Flow(flow) => Some(flow),
        _ => None,
      })
      .filter(|f| seen.insert(f.uuid.clone()))
      .collect()
  }

  /// The results this flow can produce.
  pub fn result_infos(&self) -> Vec<ResultInfo> {
    let mut infos = Vec::new();
    for node in &self.nodes {
      for action in &node.actions {
        action.results(&node.uuid, &mut |info| infos.push(info));
      }
      if let Some(router) = &node.router
        && let Some(name) = router.result_name()
      {
        let categories: Vec<&str> = router.categories().iter().map(|c| c.name.as_str()).collect();
        infos.push(ResultInfo::new(name, &categories, &node.uuid));
      }
    }
    merge_result_infos(infos)
  }

  /// A cycle made only of nodes that don't wait would route forever.
  fn detect_waitless_cycle(&self) -> Result<(), FlowError> {
    let graph: HashMap<&str, Vec<&str>> = self
      .nodes
      .iter()
      .filter(|n| n.wait.is_none())
      .map(|n| {
        let destinations = n
          .exits
          .iter()
          .filter_map(|e| e.destination_node_uuid.as_deref())
          .collect();
        (n.uuid.as_str(), destinations)
      })
      .collect();

    // 0 = unvisited, 1 = on the current path, 2 = done
    let mut state: HashMap<&str, u8> = HashMap::new();
    let mut path: Vec<&str> = Vec::new();

    fn dfs<'a>(
      node: &'a str,
      graph: &HashMap<&'a str, Vec<&'a str>>,
      state: &mut HashMap<&'a str, u8>,
      path: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
      state.insert(node, 1);
      path.push(node);

      for &next in graph.get(node).map(Vec::as_slice).unwrap_or_default() {
        // waiting nodes aren't in the graph and break any cycle through them
        if !graph.contains_key(next) {
          continue;
        }
        match state.get(next).copied().unwrap_or(0) {
          1 => {
            let start = path.iter().position(|n| *n == next).unwrap_or(0);
            return Some(path[start..].iter().map(|n| n.to_string()).collect());
          }
          0 => {
            if let Some(cycle) = dfs(next, graph, state, path) {
              return Some(cycle);
            }
          }
          _ => {}
        }
      }

      path.pop();
      state.insert(node, 2);
      None
    }

    for node in &self.nodes {
      let uuid = node.uuid.as_str();
      if graph.contains_key(uuid)
        && state.get(uuid).copied().unwrap_or(0) == 0
        && let Some(node_uuids) = dfs(uuid, &graph, &mut state, &mut path)
      {
        return Err(FlowError::Cycle { node_uuids });
      }
    }
    Ok(())
  }
}

fn validate_router(node_uuid: &str, router: &RouterDef, exits: &[ExitDef]) -> Result<(), FlowError> {
  let RouterDef::Switch {
    categories,
    cases,
    default_category_uuid,
    ..
  } = router;

  for category in categories {
    if !exits.iter().any(|e| e.uuid == category.exit_uuid) {
      return Err(FlowError::UnknownCategoryExit {
        node_uuid: node_uuid.to_string(),
        category_uuid: category.uuid.clone(),
        exit_uuid: category.exit_uuid.clone(),
      });
    }
  }

  for case in cases {
    if !categories.iter().any(|c| c.uuid == case.category_uuid) {
      return Err(FlowError::UnknownCaseCategory {
        node_uuid: node_uuid.to_string(),
        case_uuid: case.uuid.clone(),
        category_uuid: case.category_uuid.clone(),
      });
    }
    if switch::lookup(&case.test).is_none() {
      return Err(FlowError::UnknownTest {
        node_uuid: node_uuid.to_string(),
        case_uuid: case.uuid.clone(),
        test: case.test.clone(),
      });
    }
  }

  if let Some(default) = default_category_uuid
    && !categories.iter().any(|c| &c.uuid == default)
  {
    return Err(FlowError::UnknownDefaultCategory {
      node_uuid: node_uuid.to_string(),
      category_uuid: default.clone(),
    });
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn read(value: serde_json::Value) -> Result<Flow, FlowError> {
    let def: FlowDef = serde_json::from_value(value).unwrap();
    Flow::from_def(def, &Registries::default())
  }

  #[test]
  fn test_unknown_destination() {
    let err = read(json!({
      "uuid": "f1",
      "name": "Broken",
      "nodes": [{
        "uuid": "n1",
        "exits": [{"uuid": "e1", "destination_node_uuid": "n9"}]
      }]
    }))
    .unwrap_err();
    assert_eq!(err.to_string(), "destination n9 of exit[uuid=e1] isn't a known node");
  }

  #[test]
  fn test_structural_errors() {
    assert!(matches!(
      read(json!({"uuid": "f1", "name": "Empty", "nodes": []})),
      Err(FlowError::NoNodes)
    ));

    assert!(matches!(
      read(json!({"uuid": "f1", "name": "Dupes", "nodes": [
        {"uuid": "n1", "exits": [{"uuid": "e1"}]},
        {"uuid": "n1", "exits": [{"uuid": "e2"}]}
      ]})),
      Err(FlowError::DuplicateNode(uuid)) if uuid == "n1"
    ));

    assert!(matches!(
      read(json!({"uuid": "f1", "name": "Dupes", "nodes": [
        {"uuid": "n1", "exits": [{"uuid": "e1"}]},
        {"uuid": "n2", "exits": [{"uuid": "e1"}]}
      ]})),
      Err(FlowError::DuplicateExit(uuid)) if uuid == "e1"
    ));

    let err = read(json!({"uuid": "f1", "name": "Bad Action", "nodes": [
      {"uuid": "n1", "actions": [{"uuid": "a1", "type": "launch_rocket"}], "exits": [{"uuid": "e1"}]}
    ]}))
    .unwrap_err();
    assert_eq!(
      err.to_string(),
      "unable to read action on node[uuid=n1]: unknown type: 'launch_rocket'"
    );

    let err = read(json!({"uuid": "f1", "name": "Bad Router", "nodes": [{
      "uuid": "n1",
      "router": {
        "type": "switch",
        "operand": "{{ input.text }}",
        "categories": [{"uuid": "c1", "name": "All", "exit_uuid": "e9"}]
      },
      "exits": [{"uuid": "e1"}]
    }]}))
    .unwrap_err();
    assert!(matches!(err, FlowError::UnknownCategoryExit { .. }));
  }

  #[test]
  fn test_cycles_need_a_wait() {
    let looping = json!({"uuid": "f1", "name": "Loop", "nodes": [
      {"uuid": "n1", "exits": [{"uuid": "e1", "destination_node_uuid": "n2"}]},
      {"uuid": "n2", "exits": [{"uuid": "e2", "destination_node_uuid": "n1"}]}
    ]});
    let err = read(looping).unwrap_err();
    assert_eq!(err.to_string(), "nodes [n1, n2] form a cycle with no waits");

    let waiting = json!({"uuid": "f1", "name": "Loop", "nodes": [
      {"uuid": "n1", "exits": [{"uuid": "e1", "destination_node_uuid": "n2"}]},
      {"uuid": "n2", "wait": {"type": "msg"}, "exits": [{"uuid": "e2", "destination_node_uuid": "n1"}]}
    ]});
    let flow = read(waiting).unwrap();
    assert_eq!(flow.nodes.len(), 2);
    assert!(flow.node("n2").unwrap().wait.is_some());
  }

  #[test]
  fn test_result_infos_and_references() {
    let flow = read(json!({"uuid": "f1", "name": "Results", "nodes": [
      {
        "uuid": "n1",
        "actions": [
          {"uuid": "a1", "type": "set_run_result", "name": "Color", "value": "red", "category": "Red"},
          {"uuid": "a2", "type": "add_to_group", "groups": [{"uuid": "g1", "name": "Testers"}]},
          {"uuid": "a3", "type": "enter_flow", "flow": {"uuid": "f2", "name": "Child"}}
        ],
        "exits": [{"uuid": "e1", "destination_node_uuid": "n2"}]
      },
      {
        "uuid": "n2",
        "wait": {"type": "msg"},
        "router": {
          "type": "switch",
          "operand": "{{ input.text }}",
          "result_name": "color",
          "categories": [
            {"uuid": "c1", "name": "Blue", "exit_uuid": "e2"},
            {"uuid": "c2", "name": "Other", "exit_uuid": "e2"}
          ],
          "cases": [{"uuid": "k1", "type": "has_any_word", "arguments": ["blue"], "category_uuid": "c1"}],
          "default_category_uuid": "c2"
        },
        "exits": [{"uuid": "e2"}]
      }
    ]}))
    .unwrap();

    let infos = flow.result_infos();
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].key, "color");
    assert_eq!(infos[0].categories, vec!["Red", "Blue", "Other"]);
    assert_eq!(infos[0].node_uuids, vec!["n1", "n2"]);

    let refs = flow.extract_references();
    assert_eq!(refs.len(), 2);
    assert_eq!(refs[0].action_uuid.as_deref(), Some("a2"));
    assert_eq!(flow.sub_flows(), vec![FlowReference::new("f2", "Child")]);
  }
}
