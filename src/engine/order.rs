use crate::types::{CompileError, LogicGraph};
use std::collections::{HashMap, VecDeque};

/// Kahn 拓扑排序, 产出确定性的执行顺序。
/// 就绪节点之间按节点集合的插入顺序出队; 调用方只能依赖
/// "生产者先于消费者" 这一偏序, 不能依赖独立节点间的具体顺序。
pub fn execution_order(graph: &LogicGraph) -> Result<Vec<String>, CompileError> {
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    for node in &graph.nodes {
        in_degree.insert(node.id.as_str(), 0);
    }
    for conn in &graph.connections {
        if let Some(degree) = in_degree.get_mut(conn.to_node.as_str()) {
            *degree += 1;
        }
    }

    // 按插入顺序播种零入度节点
    let mut queue: VecDeque<&str> = graph
        .nodes
        .iter()
        .map(|n| n.id.as_str())
        .filter(|id| in_degree.get(id) == Some(&0))
        .collect();

    let mut order = Vec::with_capacity(graph.nodes.len());
    while let Some(node_id) = queue.pop_front() {
        order.push(node_id.to_string());

        for conn in graph.connections.iter().filter(|c| c.from_node == node_id) {
            if let Some(degree) = in_degree.get_mut(conn.to_node.as_str()) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(conn.to_node.as_str());
                }
            }
        }
    }

    // 排不完说明还有环 (对 DFS 检测的兜底)
    if order.len() != graph.nodes.len() {
        return Err(CompileError::OrderMismatch {
            ordered: order.len(),
            total: graph.nodes.len(),
        });
    }

    Ok(order)
}
