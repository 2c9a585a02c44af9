use crate::types::{CompileError, LogicGraph};
use std::collections::{HashMap, HashSet};

/// 结构校验: 起始节点、连接两端的节点/端口引用、环检测。
/// 发现第一个违例即返回, 不做多错误累积。
pub fn validate(graph: &LogicGraph) -> Result<(), CompileError> {
    if graph.start_node_id.is_empty() {
        return Err(CompileError::MissingStartNode);
    }
    if graph.get_node(&graph.start_node_id).is_none() {
        return Err(CompileError::StartNodeNotFound(graph.start_node_id.clone()));
    }

    for conn in &graph.connections {
        let from = graph
            .get_node(&conn.from_node)
            .ok_or_else(|| CompileError::NodeNotFound(conn.from_node.clone()))?;
        let to = graph
            .get_node(&conn.to_node)
            .ok_or_else(|| CompileError::NodeNotFound(conn.to_node.clone()))?;

        if !from.outputs.iter().any(|p| p.id == conn.from_port) {
            return Err(CompileError::PortNotFound {
                node: conn.from_node.clone(),
                port: conn.from_port.clone(),
            });
        }
        if !to.inputs.iter().any(|p| p.id == conn.to_port) {
            return Err(CompileError::PortNotFound {
                node: conn.to_node.clone(),
                port: conn.to_port.clone(),
            });
        }
    }

    check_cycles(graph)
}

/// DFS 环检测: visited 为全局访问记录, stack 为当前递归栈,
/// 栈上节点被再次访问即为环
fn check_cycles(graph: &LogicGraph) -> Result<(), CompileError> {
    let mut successors: HashMap<&str, Vec<&str>> = HashMap::new();
    for conn in &graph.connections {
        successors
            .entry(conn.from_node.as_str())
            .or_default()
            .push(conn.to_node.as_str());
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = Vec::new();

    fn visit<'a>(
        node_id: &'a str,
        successors: &HashMap<&'a str, Vec<&'a str>>,
        visited: &mut HashSet<&'a str>,
        stack: &mut Vec<&'a str>,
    ) -> Result<(), CompileError> {
        if stack.contains(&node_id) {
            let cycle_path: Vec<&str> = stack
                .iter()
                .skip_while(|&&x| x != node_id)
                .copied()
                .chain(std::iter::once(node_id))
                .collect();
            return Err(CompileError::CircularDependency(cycle_path.join(" -> ")));
        }
        if visited.contains(node_id) {
            return Ok(());
        }

        visited.insert(node_id);
        stack.push(node_id);

        if let Some(nexts) = successors.get(node_id) {
            for next in nexts {
                visit(next, successors, visited, stack)?;
            }
        }

        stack.pop();
        Ok(())
    }

    for node in &graph.nodes {
        visit(&node.id, &successors, &mut visited, &mut stack)?;
    }

    Ok(())
}
